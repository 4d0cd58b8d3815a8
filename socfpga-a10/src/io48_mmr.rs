//! IO48 memory mapped registers of the external memory interface (EMIF).
//!
//! These registers are written by the EMIF calibration code running on the on-die sequencer and
//! reflect the configuration of the attached memory. They are only read during SDRAM bring-up.
use arbitrary_int::{u2, u3, u4, u5, u6, u7, u9};
use core::mem::offset_of;

pub const IO48_MMR_BASE_ADDR: usize = 0xFFCF_A000;

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct CtrlCfg0 {
    #[bits(9..=13, r)]
    ctrl_burst_len: u5,
    #[bits(7..=8, r)]
    ac_pos: u2,
    #[bits(4..=6, r)]
    dimm_type: u3,
    #[bits(0..=3, r)]
    mem_type: u4,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct CtrlCfg1 {
    #[bit(7, r)]
    ctrl_enable_ecc: bool,
    /// 0: chip-row-bank-column, 1: chip-bank-row-column, 2: row-chip-bank-column.
    #[bits(5..=6, r)]
    addr_order: u2,
    #[bits(0..=4, r)]
    dbc3_burst_len: u5,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct DramTiming0 {
    /// Memory read latency (tCL) in memory clock cycles.
    #[bits(0..=6, r)]
    read_latency: u7,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct CalTiming0 {
    #[bits(18..=23, r)]
    act_to_act_diff_bg: u6,
    #[bits(12..=17, r)]
    act_to_act: u6,
    #[bits(6..=11, r)]
    act_to_pch: u6,
    #[bits(0..=5, r)]
    act_to_rdwr: u6,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct CalTiming1 {
    #[bits(24..=29, r)]
    rd_to_wr_diff_chip: u6,
    #[bits(18..=23, r)]
    rd_to_wr: u6,
    #[bits(12..=17, r)]
    rd_to_rd_diff_bg: u6,
    #[bits(6..=11, r)]
    rd_to_rd_diff_chip: u6,
    #[bits(0..=5, r)]
    rd_to_rd: u6,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct CalTiming2 {
    #[bits(24..=29, r)]
    wr_to_wr_diff_chip: u6,
    #[bits(18..=23, r)]
    wr_to_wr: u6,
    #[bits(12..=17, r)]
    rd_ap_to_valid: u6,
    #[bits(6..=11, r)]
    rd_to_pch: u6,
    #[bits(0..=5, r)]
    rd_to_wr_diff_bg: u6,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct CalTiming3 {
    #[bits(24..=29, r)]
    wr_to_pch: u6,
    #[bits(18..=23, r)]
    wr_to_rd_diff_bg: u6,
    #[bits(12..=17, r)]
    wr_to_rd_diff_chip: u6,
    #[bits(6..=11, r)]
    wr_to_rd: u6,
    #[bits(0..=5, r)]
    wr_to_wr_diff_bg: u6,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct CalTiming4 {
    #[bits(26..=31, r)]
    pdn_to_valid: u6,
    #[bits(18..=25, r)]
    arf_to_valid: u8,
    #[bits(12..=17, r)]
    pch_all_to_valid: u6,
    #[bits(6..=11, r)]
    pch_to_valid: u6,
    #[bits(0..=5, r)]
    wr_ap_to_valid: u6,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct CalTiming9 {
    /// Four-activate window (tFAW).
    #[bits(0..=7, r)]
    four_act_to_act: u8,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct DramAddrWidth {
    #[bits(16..=18, r)]
    cs_addr_width: u3,
    #[bits(14..=15, r)]
    bank_group_addr_width: u2,
    #[bits(10..=13, r)]
    bank_addr_width: u4,
    #[bits(5..=9, r)]
    row_addr_width: u5,
    #[bits(0..=4, r)]
    col_addr_width: u5,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct NiosReserve0 {
    /// bit 10: warm reset enabled during generation, bit 9: warm reset compiled into the
    /// calibration code, bit 8: user mode OCT present.
    #[bits(8..=10, r)]
    flags: u3,
    /// Number of DDR data bits, for example 0x20 for a 32 bit interface.
    #[bits(0..=7, r)]
    data_width: u8,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct NiosReserve1 {
    #[bits(10..=14, r)]
    major: u5,
    #[bits(6..=9, r)]
    minor: u4,
    #[bits(3..=5, r)]
    service_pack: u3,
    #[bits(0..=2, r)]
    variant: u3,
}

impl NiosReserve1 {
    /// Major, minor and service pack fields as one value. Zero if the EMIF IP does not report a
    /// version.
    #[inline]
    pub const fn version(&self) -> u9 {
        u9::new(((self.raw_value() >> 6) & 0x1FF) as u16)
    }
}

/// IO48 MMR register block.
#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct Io48Mmr {
    dbgcfg: [u32; 7],
    reserve: [u32; 3],
    #[mmio(PureRead)]
    ctrlcfg0: CtrlCfg0,
    #[mmio(PureRead)]
    ctrlcfg1: CtrlCfg1,
    ctrlcfg: [u32; 8],
    #[mmio(PureRead)]
    dramtiming0: DramTiming0,
    dramodt: [u32; 2],
    sbcfg: [u32; 8],
    #[mmio(PureRead)]
    caltiming0: CalTiming0,
    #[mmio(PureRead)]
    caltiming1: CalTiming1,
    #[mmio(PureRead)]
    caltiming2: CalTiming2,
    #[mmio(PureRead)]
    caltiming3: CalTiming3,
    #[mmio(PureRead)]
    caltiming4: CalTiming4,
    caltiming5_8: [u32; 4],
    #[mmio(PureRead)]
    caltiming9: CalTiming9,
    caltiming10: u32,
    #[mmio(PureRead)]
    dramaddrw: DramAddrWidth,
    sideband: [u32; 16],
    #[mmio(PureRead)]
    dramsts: u32,
    dbgdone: u32,
    dbgsignals: u32,
    dbgreset: u32,
    dbgmatch: u32,
    counter0mask: u32,
    counter1mask: u32,
    counter0match: u32,
    counter1match: u32,
    #[mmio(PureRead)]
    niosreserve0: NiosReserve0,
    #[mmio(PureRead)]
    niosreserve1: NiosReserve1,
    niosreserve2: u32,
}

static_assertions::const_assert_eq!(core::mem::size_of::<Io48Mmr>(), 0x11C);

pub const CTRLCFG0_ADDR: usize = IO48_MMR_BASE_ADDR + offset_of!(Io48Mmr, ctrlcfg0);
pub const CTRLCFG1_ADDR: usize = IO48_MMR_BASE_ADDR + offset_of!(Io48Mmr, ctrlcfg1);
pub const DRAMTIMING0_ADDR: usize = IO48_MMR_BASE_ADDR + offset_of!(Io48Mmr, dramtiming0);
pub const CALTIMING0_ADDR: usize = IO48_MMR_BASE_ADDR + offset_of!(Io48Mmr, caltiming0);
pub const CALTIMING1_ADDR: usize = IO48_MMR_BASE_ADDR + offset_of!(Io48Mmr, caltiming1);
pub const CALTIMING2_ADDR: usize = IO48_MMR_BASE_ADDR + offset_of!(Io48Mmr, caltiming2);
pub const CALTIMING3_ADDR: usize = IO48_MMR_BASE_ADDR + offset_of!(Io48Mmr, caltiming3);
pub const CALTIMING4_ADDR: usize = IO48_MMR_BASE_ADDR + offset_of!(Io48Mmr, caltiming4);
pub const CALTIMING9_ADDR: usize = IO48_MMR_BASE_ADDR + offset_of!(Io48Mmr, caltiming9);
pub const DRAMADDRW_ADDR: usize = IO48_MMR_BASE_ADDR + offset_of!(Io48Mmr, dramaddrw);
pub const NIOSRESERVE0_ADDR: usize = IO48_MMR_BASE_ADDR + offset_of!(Io48Mmr, niosreserve0);
pub const NIOSRESERVE1_ADDR: usize = IO48_MMR_BASE_ADDR + offset_of!(Io48Mmr, niosreserve1);

impl Io48Mmr {
    /// Create a new IO48 MMR MMIO instance at address [IO48_MMR_BASE_ADDR].
    ///
    /// # Safety
    ///
    /// This API can be used to potentially create a driver to the same peripheral structure
    /// from multiple threads. The user must ensure that concurrent accesses are safe and do not
    /// interfere with each other.
    pub const unsafe fn new_mmio_fixed() -> MmioIo48Mmr<'static> {
        unsafe { Self::new_mmio_at(IO48_MMR_BASE_ADDR) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_offsets() {
        assert_eq!(CTRLCFG0_ADDR, 0xFFCF_A028);
        assert_eq!(DRAMTIMING0_ADDR, 0xFFCF_A050);
        assert_eq!(CALTIMING0_ADDR, 0xFFCF_A07C);
        assert_eq!(CALTIMING9_ADDR, 0xFFCF_A0A0);
        assert_eq!(DRAMADDRW_ADDR, 0xFFCF_A0A8);
        assert_eq!(NIOSRESERVE0_ADDR, 0xFFCF_A110);
    }

    #[test]
    fn address_width_fields() {
        // CS 0, BG 0, bank 3, row 15, column 10
        let raw = (3 << 10) | (15 << 5) | 10;
        let addrw = DramAddrWidth::new_with_raw_value(raw);
        assert_eq!(addrw.col_addr_width().value(), 10);
        assert_eq!(addrw.row_addr_width().value(), 15);
        assert_eq!(addrw.bank_addr_width().value(), 3);
        assert_eq!(addrw.bank_group_addr_width().value(), 0);
        assert_eq!(addrw.cs_addr_width().value(), 0);
    }

    #[test]
    fn cal_timing_slots() {
        let caltiming2 = CalTiming2::new_with_raw_value(7 << 24);
        assert_eq!(caltiming2.wr_to_wr_diff_chip().value(), 7);
        assert_eq!(caltiming2.wr_to_wr().value(), 0);

        let caltiming3 = CalTiming3::new_with_raw_value((9 << 6) | (1 << 12) | (4 << 24));
        assert_eq!(caltiming3.wr_to_rd().value(), 9);
        assert_eq!(caltiming3.wr_to_rd_diff_chip().value(), 1);
        assert_eq!(caltiming3.wr_to_pch().value(), 4);
        assert_eq!(caltiming3.wr_to_wr_diff_bg().value(), 0);

        let caltiming4 = CalTiming4::new_with_raw_value((6 << 6) | (0xFF << 18) | (2 << 26));
        assert_eq!(caltiming4.pch_to_valid().value(), 6);
        assert_eq!(caltiming4.arf_to_valid(), 0xFF);
        assert_eq!(caltiming4.pdn_to_valid().value(), 2);
        assert_eq!(caltiming4.wr_ap_to_valid().value(), 0);
    }

    #[test]
    fn nios_version() {
        assert_eq!(NiosReserve1::new_with_raw_value(0b111).version().value(), 0);
        assert_eq!(
            NiosReserve1::new_with_raw_value((16 << 10) | (1 << 6)).version().value(),
            (16 << 4) | 1
        );
    }
}
