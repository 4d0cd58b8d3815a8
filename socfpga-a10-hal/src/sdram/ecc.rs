//! SDRAM ECC fault handling.
//!
//! Once memory is online, the HMC adapter raises an interrupt for single bit errors (SBE) after
//! [SERR_COUNT_THRESHOLD] corrected errors and for every double bit error (DBE). The
//! [EccInterruptHandler] services that interrupt. It has to be called from the interrupt handler
//! registered for the ECC interrupt, for example from the IRQ dispatch of the GIC.
//!
//! # Register ownership
//!
//! After [EccInterruptHandler::arm], the handler exclusively owns the ECC control, status, error
//! address and counter registers. The main flow must not access these registers anymore.
use core::fmt::Write;

use socfpga_a10::ecc_hmc::{
    DERRADDRA_ADDR, ECCCTRL_ADDR, ERRINTENR_ADDR, ERRINTENS_ADDR, EccControl,
    ErrorInterruptEnable, INTMODE_ADDR, INTSTAT_ADDR, InterruptMode, InterruptStatus,
    SERR_COUNT_THRESHOLD, SERRADDRA_ADDR, SERRCNTREG_ADDR,
};

use crate::regs::RegisterPort;

/// Boot environment variable holding the cumulative number of corrected single bit errors.
pub const SBE_ENV_VAR: &str = "sdram_ecc_sbe";

/// Persistent boot state visible to later boot stages.
pub trait BootEnvironment {
    fn set_ulong(&mut self, name: &str, value: u32);
}

/// Stops the system permanently.
pub trait Halt {
    fn halt(&mut self) -> !;
}

/// Parks the CPU in an endless loop.
#[derive(Debug, Default)]
pub struct CpuHalt;

impl Halt for CpuHalt {
    fn halt(&mut self) -> ! {
        loop {
            #[cfg(target_arch = "arm")]
            cortex_ar::asm::nop();
            #[cfg(not(target_arch = "arm"))]
            core::hint::spin_loop();
        }
    }
}

const ALL_ERRORS: u32 = ErrorInterruptEnable::new_with_raw_value(0)
    .with_serr(true)
    .with_derr(true)
    .raw_value();

const ALL_PENDING: u32 = InterruptStatus::new_with_raw_value(0)
    .with_serr_pending(true)
    .with_derr_pending(true)
    .raw_value();

const COUNTER_RESET: u32 = EccControl::new_with_raw_value(0)
    .with_cnt_rst(true)
    .raw_value();

/// Interrupt handler for the SDRAM ECC interrupt.
///
/// The handler never allocates and never waits on hardware state. It is not re-entrant: the
/// platform must not nest the ECC interrupt, which is the default for a GIC interrupt which is
/// still active.
pub struct EccInterruptHandler<P, E, C, H> {
    port: P,
    env: E,
    console: C,
    halt: H,
    sbe_count: u32,
}

impl<P: RegisterPort, E: BootEnvironment, C: Write, H: Halt> EccInterruptHandler<P, E, C, H> {
    /// Clears all latched ECC state and enables the SBE and DBE interrupts.
    ///
    /// The SBE interrupt fires once the error counter reaches [SERR_COUNT_THRESHOLD].
    pub fn arm(port: P, env: E, console: C, halt: H) -> Self {
        let mut handler = Self {
            port,
            env,
            console,
            halt,
            sbe_count: 0,
        };
        handler.clear_status();
        handler.port.write(SERRCNTREG_ADDR, SERR_COUNT_THRESHOLD);
        let int_mode = InterruptMode::new_with_raw_value(handler.port.read(INTMODE_ADDR))
            .with_int_on_compare(true);
        handler.port.write(INTMODE_ADDR, int_mode.raw_value());
        handler.port.write(ERRINTENS_ADDR, ALL_ERRORS);
        log::debug!("SDRAM ECC interrupts armed");
        handler
    }

    /// Services the ECC interrupt.
    ///
    /// Single bit errors are counted and reported. A double bit error disables all ECC
    /// interrupts and halts the system.
    pub fn on_interrupt(&mut self) {
        if self.service() {
            self.port.write(ERRINTENR_ADDR, ALL_ERRORS);
            log::error!("uncorrectable SDRAM ECC error, halting");
            self.halt.halt();
        }
    }

    /// Cumulative number of corrected single bit errors since arming.
    #[inline]
    pub fn sbe_count(&self) -> u32 {
        self.sbe_count
    }

    /// Returns true if a double bit error was pending.
    fn service(&mut self) -> bool {
        let status = InterruptStatus::new_with_raw_value(self.port.read(INTSTAT_ADDR));
        if status.serr_pending() {
            let addr = self.port.read(SERRADDRA_ADDR);
            let _ = writeln!(self.console, "Info: SDRAM ECC SBE @ 0x{addr:08x}");
            self.sbe_count = self
                .sbe_count
                .wrapping_add(self.port.read(SERRCNTREG_ADDR));
            self.env.set_ulong(SBE_ENV_VAR, self.sbe_count);
            log::warn!("SDRAM ECC SBE at {addr:#010x}, count {}", self.sbe_count);
        }
        if status.derr_pending() {
            let _ = self.console.write_str("Error: SDRAM ECC DBE occurred\n");
            let _ = writeln!(self.console, "sbecount = {}", self.sbe_count);
            let addr = self.port.read(DERRADDRA_ADDR);
            let _ = writeln!(self.console, "erraddr = {addr:08x}");
        }
        self.clear_status();
        status.derr_pending()
    }

    /// Pulses the error counter reset and clears both latched status bits.
    fn clear_status(&mut self) {
        let ctrl = self.port.read(ECCCTRL_ADDR);
        self.port.write(ECCCTRL_ADDR, ctrl | COUNTER_RESET);
        self.port.write(ECCCTRL_ADDR, ctrl & !COUNTER_RESET);
        self.port.write(INTSTAT_ADDR, ALL_PENDING);
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;
    use crate::sim::{HALT_MSG, SimConsole, SimEnv, SimHalt, SimPort};

    type Handler = EccInterruptHandler<SimPort, SimEnv, SimConsole, SimHalt>;

    fn armed() -> (Handler, SimPort, SimEnv, SimConsole) {
        let port = SimPort::new();
        port.write_one_to_clear(INTSTAT_ADDR);
        port.preset(ECCCTRL_ADDR, 1);
        let env = SimEnv::new();
        let console = SimConsole::new();
        let handler =
            EccInterruptHandler::arm(port.clone(), env.clone(), console.clone(), SimHalt);
        (handler, port, env, console)
    }

    #[test]
    fn arming() {
        let port = SimPort::new();
        port.write_one_to_clear(INTSTAT_ADDR);
        port.preset(INTSTAT_ADDR, 0b11);
        port.preset(ECCCTRL_ADDR, 1);
        let _handler =
            EccInterruptHandler::arm(port.clone(), SimEnv::new(), SimConsole::new(), SimHalt);
        assert_eq!(port.value(INTSTAT_ADDR), 0);
        assert_eq!(port.writes_to(ECCCTRL_ADDR), [1 | (1 << 8), 1]);
        assert_eq!(port.value(SERRCNTREG_ADDR), 8);
        assert_eq!(port.value(INTMODE_ADDR), 1 << 16);
        assert_eq!(port.value(ERRINTENS_ADDR), 0b11);
        assert!(port.writes_to(ERRINTENR_ADDR).is_empty());
    }

    #[test]
    fn single_bit_error_is_counted() {
        let (mut handler, port, env, console) = armed();
        port.preset(SERRADDRA_ADDR, 0x0012_3450);
        port.preset(SERRCNTREG_ADDR, 8);

        port.preset(INTSTAT_ADDR, 0b01);
        handler.on_interrupt();
        assert_eq!(handler.sbe_count(), 8);
        assert_eq!(env.get(SBE_ENV_VAR), Some(8));
        assert_eq!(port.value(INTSTAT_ADDR), 0);

        port.preset(INTSTAT_ADDR, 0b01);
        handler.on_interrupt();
        assert_eq!(handler.sbe_count(), 16);
        assert_eq!(env.get(SBE_ENV_VAR), Some(16));
        assert_eq!(
            console.output(),
            "Info: SDRAM ECC SBE @ 0x00123450\nInfo: SDRAM ECC SBE @ 0x00123450\n"
        );
        assert!(port.writes_to(ERRINTENR_ADDR).is_empty());
    }

    #[test]
    fn spurious_interrupt_only_clears() {
        let (mut handler, port, env, console) = armed();
        let writes_before = port.writes().len();
        handler.on_interrupt();
        assert_eq!(handler.sbe_count(), 0);
        assert_eq!(env.get(SBE_ENV_VAR), None);
        assert!(console.output().is_empty());
        assert_eq!(
            port.writes()[writes_before..],
            [
                (ECCCTRL_ADDR, 1 | (1 << 8)),
                (ECCCTRL_ADDR, 1),
                (INTSTAT_ADDR, 0b11)
            ]
        );
    }

    #[test]
    fn double_bit_error_halts() {
        let (mut handler, port, _env, console) = armed();
        port.preset(SERRADDRA_ADDR, 0x100);
        port.preset(SERRCNTREG_ADDR, 8);
        port.preset(INTSTAT_ADDR, 0b01);
        handler.on_interrupt();

        port.preset(DERRADDRA_ADDR, 0xDEAD_BEE0);
        port.preset(INTSTAT_ADDR, 0b10);
        let intstat_writes = port.writes_to(INTSTAT_ADDR).len();
        let ctrl_writes = port.writes_to(ECCCTRL_ADDR).len();

        let result = catch_unwind(AssertUnwindSafe(|| handler.on_interrupt()));
        let panic = result.expect_err("handler must halt");
        assert_eq!(panic.downcast_ref::<String>().map(String::as_str), Some(HALT_MSG));

        // The clear sequence runs exactly once.
        assert_eq!(port.writes_to(INTSTAT_ADDR).len(), intstat_writes + 1);
        assert_eq!(port.writes_to(ECCCTRL_ADDR).len(), ctrl_writes + 2);
        assert_eq!(port.value(INTSTAT_ADDR), 0);
        assert_eq!(port.writes_to(ERRINTENR_ADDR), [0b11]);
        assert_eq!(
            console.output(),
            "Info: SDRAM ECC SBE @ 0x00000100\n\
             Error: SDRAM ECC DBE occurred\n\
             sbecount = 8\n\
             erraddr = deadbee0\n"
        );
    }
}
