//! # SDRAM module
//!
//! Brings the SDRAM attached to the hard memory controller online during early boot.
//!
//! [bring_up] performs the following steps:
//!
//!  1. Checks that the FPGA is configured. The EMIF is part of the FPGA configuration.
//!  2. Releases the NoC DDR scheduler from reset.
//!  3. Runs the OCT calibration workaround with retries, see [calibration].
//!  4. Initializes the HMC adapter and the NoC DDR scheduler, see [timing].
//!  5. Determines the SDRAM size.
//!  6. Programs the NoC DDR firewalls from the board configuration, see [firewall].
//!
//! The ECC interrupt handling in [ecc] is armed separately by the platform once the interrupt
//! controller is available.
use core::fmt::Write;

use embedded_hal::delay::DelayNs;
use socfpga_a10::ecc_hmc::{DDRIOCTRL_ADDR, DdrIoControl};
use socfpga_a10::fpga_mgr::{IMGCFG_STAT_ADDR, ImageConfigStatus};
use socfpga_a10::io48_mmr::{DRAMADDRW_ADDR, DramAddrWidth};
use socfpga_a10::rstmgr::{BRGMODRST_ADDR, BridgeModuleReset};

use crate::regs::{RegisterBus, RegisterPort, Watchdog};

pub mod calibration;
pub mod ecc;
pub mod firewall;
pub mod handshake;
pub mod timing;

pub use calibration::CalibrationError;
pub use firewall::{BoardConfig, FirewallRange, FirewallSetupError, StaticBoardConfig};

/// Default SDRAM size of the platform, 1 GiB.
pub const DEFAULT_RAM_SIZE: u32 = 0x4000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BringupConfig {
    /// Used when the size derived from the controller configuration is not valid.
    pub default_ram_size: u32,
}

impl BringupConfig {
    pub const fn new(default_ram_size: u32) -> Self {
        Self { default_ram_size }
    }
}

impl Default for BringupConfig {
    fn default() -> Self {
        Self::new(DEFAULT_RAM_SIZE)
    }
}

/// Information about the SDRAM after a successful bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DramInfo {
    /// Size in bytes.
    pub size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BringupError {
    #[error("FPGA is not in user mode")]
    FpgaNotConfigured,
    #[error("SDRAM calibration failed: {0}")]
    Calibration(#[from] CalibrationError),
}

impl BringupError {
    pub const fn code(&self) -> i32 {
        -1
    }
}

/// SDRAM size in bytes for the given address widths and IO size.
///
/// Returns 0 if the size does not fit into 32 bits.
pub fn sdram_size(addrw: DramAddrWidth, ioctrl: DdrIoControl) -> u32 {
    let addr_bits = u32::from(addrw.cs_addr_width().value())
        + u32::from(addrw.bank_group_addr_width().value())
        + u32::from(addrw.bank_addr_width().value())
        + u32::from(addrw.row_addr_width().value())
        + u32::from(addrw.col_addr_width().value());
    1u32.checked_shl(addr_bits)
        .and_then(|locations| locations.checked_mul(2 << ioctrl.io_size().value()))
        .unwrap_or(0)
}

/// Reads the SDRAM size from the controller configuration.
pub fn read_sdram_size<P: RegisterPort, D: DelayNs, W: Watchdog>(
    bus: &mut RegisterBus<P, D, W>,
) -> u32 {
    let addrw = DramAddrWidth::new_with_raw_value(bus.read(DRAMADDRW_ADDR));
    let ioctrl = DdrIoControl::new_with_raw_value(bus.read(DDRIOCTRL_ADDR));
    sdram_size(addrw, ioctrl)
}

#[inline]
pub fn fpga_in_user_mode<P: RegisterPort, D: DelayNs, W: Watchdog>(
    bus: &mut RegisterBus<P, D, W>,
) -> bool {
    ImageConfigStatus::new_with_raw_value(bus.read(IMGCFG_STAT_ADDR)).f2s_usermode()
}

/// Releases the NoC DDR scheduler from reset.
pub fn release_scheduler_reset<P: RegisterPort, D: DelayNs, W: Watchdog>(
    bus: &mut RegisterBus<P, D, W>,
) {
    let mask = BridgeModuleReset::new_with_raw_value(0)
        .with_ddr_sch(true)
        .raw_value();
    bus.clear_bits(BRGMODRST_ADDR, mask);
}

/// Brings the SDRAM online.
///
/// Progress is reported on the console. A firewall configuration error is reported but does not
/// abort the bring-up. All returned errors are fatal: the SDRAM must not be used.
pub fn bring_up<P, D, W, C, B>(
    bus: &mut RegisterBus<P, D, W>,
    console: &mut C,
    board: &B,
    config: &BringupConfig,
) -> Result<DramInfo, BringupError>
where
    P: RegisterPort,
    D: DelayNs,
    W: Watchdog,
    C: Write,
    B: BoardConfig + ?Sized,
{
    if !fpga_in_user_mode(bus) {
        let _ = console.write_str("fpga not configured!\n");
        return Err(BringupError::FpgaNotConfigured);
    }
    bus.feed_watchdog();

    release_scheduler_reset(bus);
    if let Err(e) = calibration::calibrate_with_retries(bus, console) {
        let _ = console.write_str("DDRCAL: Failed\n");
        return Err(e.into());
    }
    let _ = console.write_str("DDRCAL: Success\n");
    bus.feed_watchdog();

    timing::init_controller(bus);

    let mut size = read_sdram_size(bus);
    if size == 0 {
        log::warn!(
            "invalid SDRAM geometry, using default size {:#x}",
            config.default_ram_size
        );
        size = config.default_ram_size;
    }
    log::info!("SDRAM size: {} MiB", size >> 20);

    match firewall::setup_firewall(bus, board) {
        Ok(regions) => log::debug!("{regions} SDRAM firewall region(s) opened"),
        Err(e) => {
            log::warn!("firewall setup failed: {e} ({})", e.code());
            let _ = console.write_str("FW: Error Configuring Firewall\n");
        }
    }

    Ok(DramInfo { size })
}
