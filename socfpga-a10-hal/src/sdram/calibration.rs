//! Bounded retry policy around the OCT calibration handshake.
//!
//! Only the initial silicon revision needs the handshake. On all other revisions the EMIF
//! calibrates on its own and nothing is done here.
use core::fmt::Write;

use embedded_hal::delay::DelayNs;
use socfpga_a10::ecc_hmc::{DDRCALSTAT_ADDR, DdrCalStatus};
use socfpga_a10::sysmgr::{SILICON_ID1_ADDR, SiliconId1};

use super::handshake::run_handshake;
use crate::regs::{RegisterBus, RegisterPort, Watchdog};

/// Silicon ID 1 value of the revision affected by the OCT calibration erratum.
pub const OCT_ERRATUM_SILICON_ID: u32 = 0x0001_0001;
pub const HANDSHAKE_ATTEMPTS: usize = 3;
pub const CAL_STATUS_POLLS: usize = 10;
pub const CAL_STATUS_POLL_DELAY_MS: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CalibrationError {
    #[error("could not calibrate SDRAM after {HANDSHAKE_ATTEMPTS} attempts")]
    Exhausted,
}

impl CalibrationError {
    pub const fn code(&self) -> i32 {
        -1
    }
}

/// Reads the calibration success flag of the hard memory controller.
#[inline]
pub fn is_calibrated<P: RegisterPort, D: DelayNs, W: Watchdog>(
    bus: &mut RegisterBus<P, D, W>,
) -> bool {
    DdrCalStatus::new_with_raw_value(bus.read(DDRCALSTAT_ADDR)).cal_success()
}

/// Runs the OCT calibration workaround if the silicon requires it.
///
/// Up to [HANDSHAKE_ATTEMPTS] handshakes are performed. After each successful handshake, the
/// calibration status is polled up to [CAL_STATUS_POLLS] times, [CAL_STATUS_POLL_DELAY_MS] apart.
/// Progress is reported on the console.
///
/// [CalibrationError::Exhausted] is fatal: no memory can be used without a successful
/// calibration.
pub fn calibrate_with_retries<P: RegisterPort, D: DelayNs, W: Watchdog, C: Write>(
    bus: &mut RegisterBus<P, D, W>,
    console: &mut C,
) -> Result<(), CalibrationError> {
    let silicon_id = SiliconId1::new_with_raw_value(bus.read(SILICON_ID1_ADDR));
    if silicon_id.raw_value() != OCT_ERRATUM_SILICON_ID {
        log::debug!(
            "silicon ID {:#06x} revision {}, OCT calibration workaround not required",
            silicon_id.id(),
            silicon_id.rev()
        );
        return Ok(());
    }

    for attempt in 0..HANDSHAKE_ATTEMPTS {
        bus.feed_watchdog();
        log::debug!("OCT calibration handshake, attempt {}", attempt + 1);
        if let Err(e) = run_handshake(bus) {
            let _ = writeln!(console, "DDRCAL: Failure: {}", e.code());
            continue;
        }

        for _ in 0..CAL_STATUS_POLLS {
            bus.delay_ms(CAL_STATUS_POLL_DELAY_MS);
            if is_calibrated(bus) {
                log::debug!("SDRAM calibrated after {} attempt(s)", attempt + 1);
                return Ok(());
            }
        }
        let _ = console.write_str("DDRCAL: Retry\n");
    }

    let _ = console.write_str("Error: Could Not Calibrate SDRAM\n");
    log::error!("SDRAM calibration failed");
    Err(CalibrationError::Exhausted)
}
