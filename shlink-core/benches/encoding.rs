use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use shlink_core::{
    blocks::{ExtraDataBlock, IdList, ItemId},
    constants::signatures,
    decoder::decode_link_from_bytes,
    encoder::{encode_link, ShellLinkBuilder},
    FileTime, ShellLink,
};

fn make_link(path_len: usize, items: usize) -> ShellLink {
    let stamp = FileTime::new(132_000_000_000_000_000);
    let id_list = IdList::new(
        (0..items)
            .map(|i| ItemId::new(Bytes::from(vec![i as u8; 20])).unwrap())
            .collect(),
    );
    ShellLinkBuilder::new()
        .unicode(true)
        .id_list(id_list)
        .relative_path("p".repeat(path_len))
        .working_dir("C:\\Windows\\System32")
        .arguments("--flag value")
        .times(stamp, stamp, stamp)
        .extra_data(ExtraDataBlock::new(
            signatures::SPECIAL_FOLDER,
            Bytes::from_static(&[0u8; 8]),
        ))
        .build()
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for path_len in [16, 256, 4096, 32768] {
        let link = make_link(path_len, 4);

        group.throughput(Throughput::Bytes(path_len as u64 * 2));
        group.bench_with_input(BenchmarkId::from_parameter(path_len), &link, |b, link| {
            b.iter(|| encode_link(black_box(link)).unwrap());
        });
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for path_len in [16, 256, 4096, 32768] {
        let encoded = encode_link(&make_link(path_len, 4)).unwrap();

        group.throughput(Throughput::Bytes(encoded.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(path_len), &encoded, |b, data| {
            b.iter(|| decode_link_from_bytes(black_box(data)).unwrap());
        });
    }

    group.finish();
}

fn bench_id_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("id_list");

    for items in [1, 16, 256] {
        let encoded = encode_link(&make_link(16, items)).unwrap();

        group.throughput(Throughput::Bytes(encoded.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(items), &encoded, |b, data| {
            b.iter(|| decode_link_from_bytes(black_box(data)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_id_list);
criterion_main!(benches);
