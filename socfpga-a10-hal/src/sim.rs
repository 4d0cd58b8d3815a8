//! Simulated register backend and platform doubles for the unit tests.
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use socfpga_a10::emif::{self, Core2Seq};
use socfpga_a10::fpga_mgr::{self, GeneralPurposeOut};

use crate::regs::{RegisterBus, RegisterPort, Watchdog};
use crate::sdram::ecc::{BootEnvironment, Halt};

pub type ReadHook = Box<dyn FnMut(usize, &BTreeMap<usize, u32>) -> Option<u32>>;

#[derive(Default)]
struct SimState {
    regs: BTreeMap<usize, u32>,
    w1c: BTreeSet<usize>,
    reads: Vec<usize>,
    writes: Vec<(usize, u32)>,
    hook: Option<ReadHook>,
}

/// In-memory register space. Clones share the same state.
#[derive(Clone, Default)]
pub struct SimPort(Rc<RefCell<SimState>>);

impl SimPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a register value without recording an access.
    pub fn preset(&self, addr: usize, value: u32) {
        self.0.borrow_mut().regs.insert(addr, value);
    }

    /// Writes to this register clear the bits written as one.
    pub fn write_one_to_clear(&self, addr: usize) {
        self.0.borrow_mut().w1c.insert(addr);
    }

    /// Values returned by the hook take precedence over the stored register value.
    pub fn set_read_hook(
        &self,
        hook: impl FnMut(usize, &BTreeMap<usize, u32>) -> Option<u32> + 'static,
    ) {
        self.0.borrow_mut().hook = Some(Box::new(hook));
    }

    pub fn value(&self, addr: usize) -> u32 {
        self.0.borrow().regs.get(&addr).copied().unwrap_or(0)
    }

    pub fn writes(&self) -> Vec<(usize, u32)> {
        self.0.borrow().writes.clone()
    }

    pub fn writes_to(&self, addr: usize) -> Vec<u32> {
        self.0
            .borrow()
            .writes
            .iter()
            .filter(|(a, _)| *a == addr)
            .map(|(_, v)| *v)
            .collect()
    }

    pub fn read_count(&self, addr: usize) -> usize {
        self.0.borrow().reads.iter().filter(|a| **a == addr).count()
    }

    /// All addresses which were read or written.
    pub fn touched(&self) -> BTreeSet<usize> {
        let state = self.0.borrow();
        state
            .reads
            .iter()
            .copied()
            .chain(state.writes.iter().map(|(a, _)| *a))
            .collect()
    }
}

impl RegisterPort for SimPort {
    fn read(&mut self, addr: usize) -> u32 {
        let mut state = self.0.borrow_mut();
        state.reads.push(addr);
        let stored = state.regs.get(&addr).copied().unwrap_or(0);
        match state.hook.take() {
            Some(mut hook) => {
                let value = hook(addr, &state.regs).unwrap_or(stored);
                state.hook = Some(hook);
                value
            }
            None => stored,
        }
    }

    fn write(&mut self, addr: usize, value: u32) {
        let mut state = self.0.borrow_mut();
        state.writes.push((addr, value));
        if state.w1c.contains(&addr) {
            let current = state.regs.get(&addr).copied().unwrap_or(0);
            state.regs.insert(addr, current & !value);
        } else {
            state.regs.insert(addr, value);
        }
    }
}

/// Virtual clock, only advanced by the delays requested by the code under test.
#[derive(Clone, Default)]
pub struct SimDelay(Rc<Cell<u64>>);

impl SimDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed_us(&self) -> u64 {
        self.0.get() / 1000
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.set(self.0.get() + u64::from(ns));
    }
}

#[derive(Clone, Default)]
pub struct SimWatchdog(Rc<Cell<u32>>);

impl SimWatchdog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feeds(&self) -> u32 {
        self.0.get()
    }
}

impl Watchdog for SimWatchdog {
    fn feed(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

#[derive(Clone, Default)]
pub struct SimConsole(Rc<RefCell<String>>);

impl SimConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(&self) -> String {
        self.0.borrow().clone()
    }
}

impl core::fmt::Write for SimConsole {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.0.borrow_mut().push_str(s);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct SimEnv(Rc<RefCell<BTreeMap<String, u32>>>);

impl SimEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.0.borrow().get(name).copied()
    }
}

impl BootEnvironment for SimEnv {
    fn set_ulong(&mut self, name: &str, value: u32) {
        self.0.borrow_mut().insert(String::from(name), value);
    }
}

/// Panics instead of halting so tests can observe the halt.
#[derive(Default)]
pub struct SimHalt;

pub const HALT_MSG: &str = "system halted";

impl Halt for SimHalt {
    fn halt(&mut self) -> ! {
        panic!("{}", HALT_MSG);
    }
}

pub type SimBus = RegisterBus<SimPort, SimDelay, SimWatchdog>;

pub fn sim_bus() -> (SimBus, SimPort, SimDelay, SimWatchdog) {
    let port = SimPort::new();
    let delay = SimDelay::new();
    let watchdog = SimWatchdog::new();
    (
        RegisterBus::new(port.clone(), delay.clone(), watchdog.clone()),
        port,
        delay,
        watchdog,
    )
}

/// Point at which the simulated EMIF or OCT state machine stops responding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stall {
    /// OCT ready never asserts after the EMIF leaves reset.
    OctNeverReady,
    /// The EMIF never raises its OCT request.
    EmifNeverRequests,
    /// The EMIF never drops its OCT request.
    EmifNeverReleases,
    /// The OCT engine does not drop ready when calibration is requested.
    OctNeverBusy,
    /// The OCT engine never finishes calibration.
    OctNeverCompletes,
}

/// Raw `gpi` value with the OCT ready line driven high.
const GPI_OCT_CAL_READY: u32 = 1 << 31;
/// Raw `seq2core` value with the EMIF OCT request raised.
const SEQ2CORE_OCT_REQUEST: u32 = 1 << 7;

/// Behavioural model of the EMIF sequencer and the OCT state machine, driven by the outbound
/// handshake registers.
#[derive(Debug, Default)]
pub struct EmifModel {
    stall: Option<Stall>,
    cal_requested: bool,
    emif_requested: bool,
}

impl EmifModel {
    pub fn new(stall: Option<Stall>) -> Self {
        Self {
            stall,
            ..Default::default()
        }
    }

    pub fn respond(&mut self, addr: usize, regs: &BTreeMap<usize, u32>) -> Option<u32> {
        let reg = |a: usize| regs.get(&a).copied().unwrap_or(0);
        match addr {
            fpga_mgr::GPI_ADDR => {
                let gpo = GeneralPurposeOut::new_with_raw_value(reg(fpga_mgr::GPO_ADDR));
                let out_of_reset = gpo.emif_reset_n();
                let cal_request = gpo.oct_cal_request();
                if cal_request {
                    self.cal_requested = true;
                }
                let ready = match self.stall {
                    Some(Stall::OctNeverReady) => false,
                    Some(Stall::OctNeverBusy) if cal_request => true,
                    Some(Stall::OctNeverCompletes) if self.cal_requested => false,
                    _ => out_of_reset && !cal_request,
                };
                Some(if ready { GPI_OCT_CAL_READY } else { 0 })
            }
            emif::SEQ2CORE_ADDR => {
                let done = Core2Seq::new_with_raw_value(reg(emif::CORE2SEQ_ADDR)).oct_done();
                if done {
                    self.emif_requested = true;
                }
                let request = match self.stall {
                    Some(Stall::EmifNeverRequests) => false,
                    Some(Stall::EmifNeverReleases) if self.emif_requested => true,
                    _ => done,
                };
                Some(if request { SEQ2CORE_OCT_REQUEST } else { 0 })
            }
            _ => None,
        }
    }
}

/// Installs an [EmifModel] on the port.
pub fn attach_emif(port: &SimPort, stall: Option<Stall>) {
    let mut model = EmifModel::new(stall);
    port.set_read_hook(move |addr, regs| model.respond(addr, regs));
}

#[cfg(test)]
mod tests {
    use super::*;
    use socfpga_a10::emif::Seq2Core;
    use socfpga_a10::fpga_mgr::GeneralPurposeIn;

    #[test]
    fn model_drives_the_decoded_signals() {
        assert!(GeneralPurposeIn::new_with_raw_value(GPI_OCT_CAL_READY).oct_cal_ready());
        assert!(Seq2Core::new_with_raw_value(SEQ2CORE_OCT_REQUEST).oct_request());
    }

    #[test]
    fn oct_ready_follows_emif_reset() {
        let mut port = SimPort::new();
        attach_emif(&port, None);
        assert_eq!(port.read(fpga_mgr::GPI_ADDR), 0);
        port.write(fpga_mgr::GPO_ADDR, 0x8000_0000);
        assert_eq!(port.read(fpga_mgr::GPI_ADDR), GPI_OCT_CAL_READY);
        port.write(emif::CORE2SEQ_ADDR, 0x80);
        assert_eq!(port.read(emif::SEQ2CORE_ADDR), SEQ2CORE_OCT_REQUEST);
    }
}
