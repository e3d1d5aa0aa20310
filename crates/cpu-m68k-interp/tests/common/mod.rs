//! Shared test machine: 64 KiB of RAM at $000000, I/O at $FF0000.
//!
//! Vectors: SSP $1000, PC $0400. Every other vector n points at
//! `handler(n)` so tests can tell which exception was taken from the PC.

#![allow(dead_code)]

use cpu_m68k_interp::{
    BankId, Cpu68000, CpuConfig, FunctionCode, InterruptAck, IrqChange, M68kHost, StepOutcome,
};

pub const CODE: u32 = 0x0400;
pub const STACK: u32 = 0x1000;
pub const IO_BASE: u32 = 0xFF_0000;

/// Address the vector table sends vector `n` to.
pub fn handler(n: u8) -> u32 {
    0x4000 + u32::from(n) * 0x10
}

#[derive(Debug, Default)]
pub struct TestHost {
    /// (address, value, width in bytes) of every I/O write.
    pub io_writes: Vec<(u32, u32, u8)>,
    /// (address, is write) of every I/O access, in bus order.
    pub io_log: Vec<(u32, bool)>,
    pub io_read_value: u16,
    pub ack: Option<InterruptAck>,
    pub acks: Vec<u8>,
    pub resets: u32,
    pub refuse_tas: bool,
    pub fc_changes: Vec<FunctionCode>,
    pub pending_irq: Option<IrqChange>,
}

impl M68kHost for TestHost {
    fn read_byte(&mut self, addr: u32) -> u8 {
        self.io_log.push((addr, false));
        self.io_read_value as u8
    }

    fn read_word(&mut self, addr: u32) -> u16 {
        self.io_log.push((addr, false));
        self.io_read_value
    }

    fn write_byte(&mut self, addr: u32, value: u8) {
        self.io_log.push((addr, true));
        self.io_writes.push((addr, u32::from(value), 1));
    }

    fn write_word(&mut self, addr: u32, value: u16) {
        self.io_log.push((addr, true));
        self.io_writes.push((addr, u32::from(value), 2));
    }

    fn interrupt_ack(&mut self, level: u8) -> InterruptAck {
        self.acks.push(level);
        self.ack.unwrap_or(InterruptAck::Autovector)
    }

    fn reset_instruction(&mut self) {
        self.resets += 1;
    }

    fn tas_writeback(&mut self) -> bool {
        !self.refuse_tas
    }

    fn function_code_changed(&mut self, fc: FunctionCode) {
        self.fc_changes.push(fc);
    }

    fn poll_irq(&mut self) -> Option<IrqChange> {
        self.pending_irq.take()
    }
}

pub struct Machine {
    pub cpu: Cpu68000,
    pub host: TestHost,
    pub ram: BankId,
}

impl Machine {
    pub fn new(program: &[u16]) -> Self {
        Self::with_config(CpuConfig::default(), program)
    }

    /// Build the machine, load `program` at $0400 and pulse reset.
    pub fn with_config(config: CpuConfig, program: &[u16]) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut cpu = Cpu68000::with_config(config);
        let ram = cpu.memory_mut().add_bank(0x1_0000);
        cpu.memory_mut().map_ram(0, 0x1_0000, ram);
        cpu.memory_mut().map_io(IO_BASE, 0x1_0000);

        let mut m = Self {
            cpu,
            host: TestHost::default(),
            ram,
        };
        m.poke_long(0, STACK);
        m.poke_long(4, CODE);
        for n in 2..=255u8 {
            m.poke_long(u32::from(n) * 4, handler(n));
        }
        m.load_words(CODE, program);
        m.cpu.pulse_reset(&mut m.host);
        m
    }

    pub fn load_words(&mut self, addr: u32, words: &[u16]) {
        for (i, &word) in words.iter().enumerate() {
            self.poke_word(addr + 2 * i as u32, word);
        }
    }

    pub fn poke_byte(&mut self, addr: u32, value: u8) {
        self.cpu.memory_mut().load(self.ram, addr, &[value]);
    }

    pub fn poke_word(&mut self, addr: u32, value: u16) {
        self.cpu.memory_mut().load(self.ram, addr, &value.to_be_bytes());
    }

    pub fn poke_long(&mut self, addr: u32, value: u32) {
        self.cpu.memory_mut().load(self.ram, addr, &value.to_be_bytes());
    }

    pub fn peek_byte(&self, addr: u32) -> u8 {
        self.cpu.memory().bank(self.ram)[addr as usize]
    }

    pub fn peek_word(&self, addr: u32) -> u16 {
        let bank = self.cpu.memory().bank(self.ram);
        u16::from_be_bytes([bank[addr as usize], bank[addr as usize + 1]])
    }

    pub fn peek_long(&self, addr: u32) -> u32 {
        (u32::from(self.peek_word(addr)) << 16) | u32::from(self.peek_word(addr + 2))
    }

    pub fn step(&mut self) -> StepOutcome {
        self.cpu.step(&mut self.host)
    }

    /// Step once and return the master clocks it took.
    pub fn step_cycles(&mut self) -> u32 {
        self.cpu.step(&mut self.host);
        self.cpu.cycles_run()
    }

    pub fn run(&mut self, budget: u32) -> u32 {
        self.cpu.run(&mut self.host, budget)
    }
}
