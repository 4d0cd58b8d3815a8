//! FPGA manager.
//!
//! Besides the FPGA status, the general purpose output and input registers of the FPGA manager
//! carry two of the EMIF calibration handshake signals: the active-low EMIF reset override and the
//! on-chip termination (OCT) calibration request/ready pair.
use core::mem::offset_of;

pub const FPGA_MGR_BASE_ADDR: usize = 0xFFD0_3000;

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct GeneralPurposeOut {
    /// EMIF reset override, active low.
    #[bit(31, rw)]
    emif_reset_n: bool,
    #[bit(30, rw)]
    oct_cal_request: bool,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct GeneralPurposeIn {
    #[bit(31, r)]
    oct_cal_ready: bool,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct ImageConfigStatus {
    /// The FPGA fabric is configured and has entered user mode.
    #[bit(1, r)]
    f2s_usermode: bool,
}

#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct FpgaManager {
    _reserved0: [u32; 2],
    dclkcnt: u32,
    dclkstat: u32,
    gpo: GeneralPurposeOut,
    #[mmio(PureRead)]
    gpi: GeneralPurposeIn,
    #[mmio(PureRead)]
    misci: u32,
    _reserved1: [u32; 21],
    imgcfg_ctrl: [u32; 3],
    _reserved2: u32,
    #[mmio(PureRead)]
    imgcfg_stat: ImageConfigStatus,
}

static_assertions::const_assert_eq!(core::mem::size_of::<FpgaManager>(), 0x84);

pub const GPO_ADDR: usize = FPGA_MGR_BASE_ADDR + offset_of!(FpgaManager, gpo);
pub const GPI_ADDR: usize = FPGA_MGR_BASE_ADDR + offset_of!(FpgaManager, gpi);
pub const IMGCFG_STAT_ADDR: usize = FPGA_MGR_BASE_ADDR + offset_of!(FpgaManager, imgcfg_stat);

impl FpgaManager {
    /// Create a new FPGA manager MMIO instance at address [FPGA_MGR_BASE_ADDR].
    ///
    /// # Safety
    ///
    /// This API can be used to potentially create a driver to the same peripheral structure
    /// from multiple threads. The user must ensure that concurrent accesses are safe and do not
    /// interfere with each other.
    pub const unsafe fn new_mmio_fixed() -> MmioFpgaManager<'static> {
        unsafe { Self::new_mmio_at(FPGA_MGR_BASE_ADDR) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_register_addresses() {
        assert_eq!(GPO_ADDR, 0xFFD0_3010);
        assert_eq!(GPI_ADDR, 0xFFD0_3014);
        assert_eq!(IMGCFG_STAT_ADDR, 0xFFD0_3080);
    }

    #[test]
    fn gpo_bit_positions() {
        let gpo = GeneralPurposeOut::new_with_raw_value(0).with_emif_reset_n(true);
        assert_eq!(gpo.raw_value(), 0x8000_0000);
        let gpo = gpo.with_emif_reset_n(false).with_oct_cal_request(true);
        assert_eq!(gpo.raw_value(), 0x4000_0000);
    }

    #[test]
    fn gpi_oct_ready_bit() {
        assert!(GeneralPurposeIn::new_with_raw_value(0x8000_0000).oct_cal_ready());
        assert!(!GeneralPurposeIn::new_with_raw_value(0x7FFF_FFFF).oct_cal_ready());
    }
}
