use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ricoh_core::cpu_6502::{Cpu6502, Memory6502};

/// Flat 64 KiB memory for benchmarking.
struct BenchMemory {
    ram: Vec<u8>,
}

impl BenchMemory {
    fn new() -> Self {
        let mut ram = vec![0; 0x10000];

        // Reset vector -> $8000
        ram[0xFFFC] = 0x00;
        ram[0xFFFD] = 0x80;

        // A small arithmetic loop at $8000:
        //   LDA #$42 / STA $0200 / LDX #$10 / LDY #$20
        //   INX / INY / DEX / DEY / ADC #$01 / JMP $8000
        let program = [
            0xA9, 0x42, 0x8D, 0x00, 0x02, 0xA2, 0x10, 0xA0, 0x20, 0xE8, 0xC8, 0xCA, 0x88,
            0x69, 0x01, 0x4C, 0x00, 0x80,
        ];
        ram[0x8000..0x8000 + program.len()].copy_from_slice(&program);

        Self { ram }
    }
}

impl Memory6502 for BenchMemory {
    fn read(&mut self, addr: u16) -> u8 {
        self.ram[addr as usize]
    }

    fn write(&mut self, addr: u16, val: u8) {
        self.ram[addr as usize] = val;
    }
}

fn bench_cpu_clock(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_6502_clock");

    for cycle_count in [100u32, 1_000, 10_000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(cycle_count),
            cycle_count,
            |b, &count| {
                b.iter(|| {
                    let mut mem = BenchMemory::new();
                    let mut cpu = Cpu6502::new();
                    cpu.reset(&mut mem);
                    for _ in 0..count {
                        cpu.clock(&mut mem);
                    }
                    black_box(cpu.cycles);
                });
            },
        );
    }

    group.finish();
}

fn bench_cpu_step_instruction(c: &mut Criterion) {
    c.bench_function("cpu_6502_step_instruction", |b| {
        b.iter(|| {
            let mut mem = BenchMemory::new();
            let mut cpu = Cpu6502::new();
            cpu.reset(&mut mem);
            for _ in 0..100 {
                cpu.step_instruction(&mut mem);
            }
            black_box(cpu.a);
        });
    });
}

fn bench_cpu_reset(c: &mut Criterion) {
    c.bench_function("cpu_6502_reset", |b| {
        let mut mem = BenchMemory::new();
        let mut cpu = Cpu6502::new();
        b.iter(|| {
            cpu.reset(&mut mem);
            black_box(cpu.pc);
        });
    });
}

criterion_group!(
    benches,
    bench_cpu_clock,
    bench_cpu_step_instruction,
    bench_cpu_reset
);
criterion_main!(benches);
