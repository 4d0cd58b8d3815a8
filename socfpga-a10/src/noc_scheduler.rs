//! NoC DDR scheduler.
//!
//! The scheduler arbitrates the L3 and FPGA-to-SDRAM traffic towards the hard memory controller.
//! Its timing registers are not filled in by hardware and must be derived from the IO48 memory
//! mapped registers after calibration.
use arbitrary_int::{u2, u3, u4, u5, u6};
use core::mem::offset_of;

pub const NOC_DDR_SCHEDULER_BASE_ADDR: usize = 0xFFD1_2400;

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct DdrConf {
    /// Index into the supported address mapping configurations.
    #[bits(0..=4, rw)]
    ddr_conf: u5,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct DdrTiming {
    /// Set when the HMC runs at half the bandwidth of the NoC interface.
    #[bit(31, rw)]
    bw_ratio: bool,
    #[bits(26..=30, rw)]
    wr_to_rd: u5,
    #[bits(21..=25, rw)]
    rd_to_wr: u5,
    #[bits(18..=20, rw)]
    burst_len: u3,
    #[bits(12..=17, rw)]
    wr_to_miss: u6,
    #[bits(6..=11, rw)]
    rd_to_miss: u6,
    #[bits(0..=5, rw)]
    act_to_act: u6,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct DdrMode {
    #[bit(1, rw)]
    bw_ratio_extended: bool,
    #[bit(0, rw)]
    auto_precharge: bool,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct ReadLatency {
    #[bits(0..=7, rw)]
    read_latency: u8,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct Activate {
    /// Number of banks of a device involved in the FAW period.
    #[bits(10..=11, rw)]
    faw_bank: u2,
    #[bits(4..=9, rw)]
    faw: u6,
    #[bits(0..=3, rw)]
    rrd: u4,
}

/// Bus turnaround when data bus ownership changes between devices.
#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct DevToDev {
    #[bits(4..=5, rw)]
    bus_wr_to_rd: u2,
    #[bits(2..=3, rw)]
    bus_rd_to_wr: u2,
    #[bits(0..=1, rw)]
    bus_rd_to_rd: u2,
}

/// NoC DDR scheduler register block.
#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct NocDdrScheduler {
    #[mmio(PureRead)]
    core_id: u32,
    #[mmio(PureRead)]
    revision_id: u32,
    ddr_conf: DdrConf,
    ddr_timing: DdrTiming,
    ddr_mode: DdrMode,
    read_latency: ReadLatency,
    _reserved0: [u32; 8],
    activate: Activate,
    dev_to_dev: DevToDev,
}

static_assertions::const_assert_eq!(core::mem::size_of::<NocDdrScheduler>(), 0x40);

pub const DDRCONF_ADDR: usize = NOC_DDR_SCHEDULER_BASE_ADDR + offset_of!(NocDdrScheduler, ddr_conf);
pub const DDRTIMING_ADDR: usize =
    NOC_DDR_SCHEDULER_BASE_ADDR + offset_of!(NocDdrScheduler, ddr_timing);
pub const DDRMODE_ADDR: usize = NOC_DDR_SCHEDULER_BASE_ADDR + offset_of!(NocDdrScheduler, ddr_mode);
pub const READ_LATENCY_ADDR: usize =
    NOC_DDR_SCHEDULER_BASE_ADDR + offset_of!(NocDdrScheduler, read_latency);
pub const ACTIVATE_ADDR: usize =
    NOC_DDR_SCHEDULER_BASE_ADDR + offset_of!(NocDdrScheduler, activate);
pub const DEVTODEV_ADDR: usize =
    NOC_DDR_SCHEDULER_BASE_ADDR + offset_of!(NocDdrScheduler, dev_to_dev);

impl NocDdrScheduler {
    /// Create a new NoC DDR scheduler MMIO instance at address [NOC_DDR_SCHEDULER_BASE_ADDR].
    ///
    /// # Safety
    ///
    /// This API can be used to potentially create a driver to the same peripheral structure
    /// from multiple threads. The user must ensure that concurrent accesses are safe and do not
    /// interfere with each other.
    pub const unsafe fn new_mmio_fixed() -> MmioNocDdrScheduler<'static> {
        unsafe { Self::new_mmio_at(NOC_DDR_SCHEDULER_BASE_ADDR) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_offsets() {
        assert_eq!(DDRCONF_ADDR, 0xFFD1_2408);
        assert_eq!(DDRTIMING_ADDR, 0xFFD1_240C);
        assert_eq!(DDRMODE_ADDR, 0xFFD1_2410);
        assert_eq!(READ_LATENCY_ADDR, 0xFFD1_2414);
        assert_eq!(ACTIVATE_ADDR, 0xFFD1_2438);
        assert_eq!(DEVTODEV_ADDR, 0xFFD1_243C);
    }
}
