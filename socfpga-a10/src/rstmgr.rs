//! Reset manager, limited to the registers up to the bridge module reset register.
use core::mem::offset_of;

pub const RSTMGR_BASE_ADDR: usize = 0xFFD0_5000;

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct BridgeModuleReset {
    /// NoC DDR scheduler.
    #[bit(6, rw)]
    ddr_sch: bool,
    #[bit(5, rw)]
    f2s_sdram2: bool,
    #[bit(4, rw)]
    f2s_sdram1: bool,
    #[bit(3, rw)]
    f2s_sdram0: bool,
    #[bit(2, rw)]
    fpga2hps: bool,
    #[bit(1, rw)]
    lwhps2fpga: bool,
    #[bit(0, rw)]
    hps2fpga: bool,
}

#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct ResetManager {
    #[mmio(PureRead)]
    stat: u32,
    #[mmio(PureRead)]
    ramstat: u32,
    #[mmio(PureRead)]
    miscstat: u32,
    ctrl: u32,
    hdsken: u32,
    hdskreq: u32,
    #[mmio(PureRead)]
    hdskack: u32,
    counts: u32,
    mpumodrst: u32,
    per0modrst: u32,
    per1modrst: u32,
    brgmodrst: BridgeModuleReset,
}

static_assertions::const_assert_eq!(core::mem::size_of::<ResetManager>(), 0x30);

pub const BRGMODRST_ADDR: usize = RSTMGR_BASE_ADDR + offset_of!(ResetManager, brgmodrst);

impl ResetManager {
    /// Create a new reset manager MMIO instance at address [RSTMGR_BASE_ADDR].
    ///
    /// # Safety
    ///
    /// This API can be used to potentially create a driver to the same peripheral structure
    /// from multiple threads. The user must ensure that concurrent accesses are safe and do not
    /// interfere with each other.
    pub const unsafe fn new_mmio_fixed() -> MmioResetManager<'static> {
        unsafe { Self::new_mmio_at(RSTMGR_BASE_ADDR) }
    }
}
