//! ECC and hard memory controller (HMC) adapter block.
use arbitrary_int::u2;
use core::mem::offset_of;

pub const ECC_HMC_BASE_ADDR: usize = 0xFFCF_B000;

/// Single bit error count after which the SBE interrupt fires when interrupt-on-compare mode is
/// active.
pub const SERR_COUNT_THRESHOLD: u32 = 8;

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct DdrIoControl {
    /// Encoded DDR interface width. 0: 16 bit, 1: 32 bit, 2: 64 bit.
    #[bits(0..=1, rw)]
    io_size: u2,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct DdrCalStatus {
    #[bit(0, r)]
    cal_success: bool,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct EccControl {
    /// Auto write-back drop counter reset.
    #[bit(16, rw)]
    awb_cnt_rst: bool,
    /// Error counter reset.
    #[bit(8, rw)]
    cnt_rst: bool,
    #[bit(0, rw)]
    ecc_en: bool,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct EccControl2 {
    /// Read-modify-write for partial writes.
    #[bit(8, rw)]
    rmw_en: bool,
    /// Auto write-back of corrected data.
    #[bit(0, rw)]
    awb_en: bool,
}

/// Layout shared by the interrupt enable, enable-set and enable-reset registers.
#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct ErrorInterruptEnable {
    #[bit(1, rw)]
    derr: bool,
    #[bit(0, rw)]
    serr: bool,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct InterruptMode {
    /// Only raise the SBE interrupt once the error counter reached the compare value.
    #[bit(16, rw)]
    int_on_compare: bool,
}

/// Latched interrupt status. Both bits are write-one-to-clear.
#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct InterruptStatus {
    #[bit(1, rw)]
    derr_pending: bool,
    #[bit(0, rw)]
    serr_pending: bool,
}

/// ECC/HMC adapter register block.
#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct EccHmc {
    #[mmio(PureRead)]
    ip_rev_id: u32,
    _reserved0: u32,
    ddrioctrl: DdrIoControl,
    #[mmio(PureRead)]
    ddrcalstat: DdrCalStatus,
    #[mmio(PureRead)]
    mpr_beat1: [u32; 9],
    #[mmio(PureRead)]
    mpr_beat2: [u32; 9],
    _reserved1: [u32; 2],
    auto_precharge: u32,
    _reserved2: [u32; 39],
    eccctrl: EccControl,
    eccctrl2: EccControl2,
    _reserved3: [u32; 2],
    errinten: ErrorInterruptEnable,
    #[mmio(Write)]
    errintens: ErrorInterruptEnable,
    #[mmio(Write)]
    errintenr: ErrorInterruptEnable,
    intmode: InterruptMode,
    #[mmio(PureRead, Write)]
    intstat: InterruptStatus,
    diaginttest: u32,
    #[mmio(PureRead)]
    modstat: u32,
    #[mmio(PureRead)]
    derraddra: u32,
    #[mmio(PureRead)]
    serraddra: u32,
    _reserved4: u32,
    #[mmio(PureRead)]
    autowb_corraddr: u32,
    serrcntreg: u32,
    #[mmio(PureRead)]
    autowb_drop_cntreg: u32,
    _reserved5: u32,
    ecc_reg2wreccdatabus: u32,
    #[mmio(PureRead)]
    ecc_rdeccdata2regbus: u32,
    ecc_reg2rdeccdatabus: u32,
    _reserved6: [u32; 3],
    ecc_diagon: u32,
    #[mmio(PureRead)]
    ecc_decstat: u32,
    _reserved7: [u32; 2],
    ecc_errgenaddr: [u32; 4],
}

static_assertions::const_assert_eq!(core::mem::size_of::<EccHmc>(), 0x180);

pub const DDRIOCTRL_ADDR: usize = ECC_HMC_BASE_ADDR + offset_of!(EccHmc, ddrioctrl);
pub const DDRCALSTAT_ADDR: usize = ECC_HMC_BASE_ADDR + offset_of!(EccHmc, ddrcalstat);
pub const ECCCTRL_ADDR: usize = ECC_HMC_BASE_ADDR + offset_of!(EccHmc, eccctrl);
pub const ECCCTRL2_ADDR: usize = ECC_HMC_BASE_ADDR + offset_of!(EccHmc, eccctrl2);
pub const ERRINTENS_ADDR: usize = ECC_HMC_BASE_ADDR + offset_of!(EccHmc, errintens);
pub const ERRINTENR_ADDR: usize = ECC_HMC_BASE_ADDR + offset_of!(EccHmc, errintenr);
pub const INTMODE_ADDR: usize = ECC_HMC_BASE_ADDR + offset_of!(EccHmc, intmode);
pub const INTSTAT_ADDR: usize = ECC_HMC_BASE_ADDR + offset_of!(EccHmc, intstat);
pub const DERRADDRA_ADDR: usize = ECC_HMC_BASE_ADDR + offset_of!(EccHmc, derraddra);
pub const SERRADDRA_ADDR: usize = ECC_HMC_BASE_ADDR + offset_of!(EccHmc, serraddra);
pub const SERRCNTREG_ADDR: usize = ECC_HMC_BASE_ADDR + offset_of!(EccHmc, serrcntreg);

impl EccHmc {
    /// Create a new ECC/HMC MMIO instance at address [ECC_HMC_BASE_ADDR].
    ///
    /// # Safety
    ///
    /// This API can be used to potentially create a driver to the same peripheral structure
    /// from multiple threads. The user must ensure that concurrent accesses are safe and do not
    /// interfere with each other.
    pub const unsafe fn new_mmio_fixed() -> MmioEccHmc<'static> {
        unsafe { Self::new_mmio_at(ECC_HMC_BASE_ADDR) }
    }
}
