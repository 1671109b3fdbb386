use criterion::{black_box, criterion_group, criterion_main, Criterion};

use pbwire::{Reader, Writer};

macro_rules! add_write_group {
    ($g:ident, $n:expr, $f:ident, $v:expr) => {
        $g.bench_function($n, |b| {
            let mut output = Vec::with_capacity(16);
            b.iter(|| {
                output.clear();
                let mut writer = Writer::new(&mut output);
                writer.$f(1, black_box($v));
            });
        });
    };
}

macro_rules! add_read_group {
    ($g:ident, $n:expr, $f:ident, $v:expr) => {
        $g.bench_function($n, |b| {
            b.iter(|| {
                let mut reader = Reader::new(black_box($v));
                reader.next().unwrap();
                reader.$f().unwrap()
            });
        });
    };
}

fn write_varint(c: &mut Criterion) {
    let mut group = c.benchmark_group("write-varint");
    add_write_group!(group, "1-byte", add_uint32, 127u32);
    add_write_group!(group, "2-byte", add_uint32, 16_383u32);
    add_write_group!(group, "3-byte", add_uint32, 2_097_151u32);
    add_write_group!(group, "4-byte", add_uint32, 268_435_455u32);
    add_write_group!(group, "5-byte", add_uint32, u32::MAX);
    add_write_group!(group, "10-byte", add_uint64, u64::MAX);
    group.finish();
}

fn read_varint(c: &mut Criterion) {
    let mut group = c.benchmark_group("read-varint");
    add_read_group!(group, "1-byte", get_uint32, &[0x08, 0x7F]);
    add_read_group!(group, "2-byte", get_uint32, &[0x08, 0xFF, 0x7F]);
    add_read_group!(group, "5-byte", get_uint32, &[0x08, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    add_read_group!(
        group,
        "10-byte",
        get_uint64,
        &[0x08, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]
    );
    group.finish();
}

fn read_fixed(c: &mut Criterion) {
    let mut group = c.benchmark_group("read-fixed");
    add_read_group!(group, "fixed32", get_fixed32, &[0x0D, 0x4E, 0x61, 0xBC, 0x00]);
    add_read_group!(
        group,
        "fixed64",
        get_fixed64,
        &[0x09, 1, 2, 3, 4, 5, 6, 7, 8]
    );
    group.finish();
}

fn message_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("message");
    group.bench_function("write", |b| {
        let mut buffer = Vec::with_capacity(128);
        b.iter(|| {
            buffer.clear();
            let mut writer = Writer::new(&mut buffer);
            writer.add_fixed32(1, black_box(12345678));
            writer.add_uint32(4, black_box(22));
            {
                let mut sub = writer.submessage(5);
                sub.add_string(1, black_box("foobar"));
            }
            writer.add_packed_sint32(7, black_box([-17, 22]));
        });
    });

    let mut buffer = Vec::new();
    {
        let mut writer = Writer::new(&mut buffer);
        writer.add_fixed32(1, 12345678);
        writer.add_uint32(4, 22);
        {
            let mut sub = writer.submessage(5);
            sub.add_string(1, "foobar");
        }
        writer.add_packed_sint32(7, [-17, 22]);
    }
    group.bench_function("read", |b| {
        b.iter(|| {
            let mut reader = Reader::new(black_box(&buffer));
            let mut sum = 0i64;
            while reader.next().unwrap() {
                match reader.tag() {
                    1 => sum += i64::from(reader.get_fixed32().unwrap()),
                    4 => sum += i64::from(reader.get_uint32().unwrap()),
                    5 => {
                        reader.get_message().unwrap();
                    }
                    7 => {
                        for value in reader.get_packed_sint32().unwrap() {
                            sum += i64::from(value.unwrap());
                        }
                    }
                    _ => reader.skip().unwrap(),
                }
            }
            sum
        });
    });
    group.finish();
}

criterion_group!(benches, write_varint, read_varint, read_fixed, message_roundtrip);
criterion_main!(benches);
