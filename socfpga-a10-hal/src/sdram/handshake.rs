//! OCT calibration handshake between the HPS, the EMIF sequencer and the OCT state machine.
//!
//! ```text
//! EMIF core                     HPS                          OCT FSM
//! ====================================================================
//! seq2core[7]  ==============>
//!                OCT request
//! core2seq[7]  <==============
//!                OCT done
//!                               gpout[30]  ==============>  request
//!                               gpin[31]   <==============  ready
//!                               gpout[31]  EMIF reset override (active low)
//! ```
//!
//! The protocol is a fixed sequence of register pokes and bounded waits. It is encoded as a
//! transition table so every wait has its own, distinct failure.
use embedded_hal::delay::DelayNs;
use socfpga_a10::emif::{CORE2SEQ_ADDR, Core2Seq, SEQ2CORE_ADDR, Seq2Core};
use socfpga_a10::fpga_mgr::{GPI_ADDR, GPO_ADDR, GeneralPurposeIn, GeneralPurposeOut};

use crate::regs::{RegisterBus, RegisterPort, Watchdog};

const EMIF_RESET_N: u32 = GeneralPurposeOut::new_with_raw_value(0)
    .with_emif_reset_n(true)
    .raw_value();

const OCT_CAL_REQUEST: u32 = GeneralPurposeOut::new_with_raw_value(0)
    .with_oct_cal_request(true)
    .raw_value();

const OCT_DONE: u32 = Core2Seq::new_with_raw_value(0)
    .with_oct_done(true)
    .raw_value();

fn oct_cal_ready(gpi: u32) -> bool {
    GeneralPurposeIn::new_with_raw_value(gpi).oct_cal_ready()
}

fn emif_oct_request(seq2core: u32) -> bool {
    Seq2Core::new_with_raw_value(seq2core).oct_request()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HandshakeError {
    #[error("OCT circuitry did not come out of reset")]
    OctReadyTimeout,
    #[error("EMIF did not request OCT calibration")]
    EmifRequestTimeout,
    #[error("EMIF did not release its OCT request")]
    EmifReleaseTimeout,
    #[error("OCT engine did not accept the calibration request")]
    OctBusyTimeout,
    #[error("OCT calibration did not complete")]
    OctCalTimeout,
}

impl HandshakeError {
    /// Numeric failure code as printed on the console.
    pub const fn code(&self) -> i32 {
        match self {
            HandshakeError::OctReadyTimeout => -1,
            HandshakeError::EmifRequestTimeout => -2,
            HandshakeError::EmifReleaseTimeout => -3,
            HandshakeError::OctBusyTimeout => -4,
            HandshakeError::OctCalTimeout => -5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Empirically required settle time before touching the EMIF.
    Settle,
    ResetEmif,
    ClearCore2Seq,
    ClearOctRequest,
    ReleaseEmifReset,
    WaitOctReady,
    SignalOctDone,
    WaitEmifRequest,
    AckEmifRequest,
    WaitEmifRelease,
    TriggerOctCal,
    WaitOctBusy,
    ReleaseOctRequest,
    WaitOctComplete,
    ProceedEmifCal,
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Delay {
        ms: u32,
    },
    Write {
        addr: usize,
        value: u32,
    },
    SetBits {
        addr: usize,
        mask: u32,
    },
    ClearBits {
        addr: usize,
        mask: u32,
    },
    Poll {
        addr: usize,
        /// Decodes the handshake signal from the raw register value.
        signal: fn(u32) -> bool,
        expected: bool,
        timeout_us: u32,
        error: HandshakeError,
    },
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    state: HandshakeState,
    action: Action,
    /// Delay after the action completed successfully.
    settle_ms: u32,
}

const fn step(state: HandshakeState, action: Action, settle_ms: u32) -> Transition {
    Transition {
        state,
        action,
        settle_ms,
    }
}

const fn poll(
    addr: usize,
    signal: fn(u32) -> bool,
    expected: bool,
    timeout_us: u32,
    error: HandshakeError,
) -> Action {
    Action::Poll {
        addr,
        signal,
        expected,
        timeout_us,
        error,
    }
}

const SEQUENCE: [Transition; 15] = [
    step(HandshakeState::Settle, Action::Delay { ms: 500 }, 0),
    step(
        HandshakeState::ResetEmif,
        Action::ClearBits {
            addr: GPO_ADDR,
            mask: EMIF_RESET_N,
        },
        10,
    ),
    step(
        HandshakeState::ClearCore2Seq,
        Action::Write {
            addr: CORE2SEQ_ADDR,
            value: 0,
        },
        0,
    ),
    step(
        HandshakeState::ClearOctRequest,
        Action::ClearBits {
            addr: GPO_ADDR,
            mask: OCT_CAL_REQUEST,
        },
        5,
    ),
    step(
        HandshakeState::ReleaseEmifReset,
        Action::SetBits {
            addr: GPO_ADDR,
            mask: EMIF_RESET_N,
        },
        10,
    ),
    step(
        HandshakeState::WaitOctReady,
        poll(
            GPI_ADDR,
            oct_cal_ready,
            true,
            1_000_000,
            HandshakeError::OctReadyTimeout,
        ),
        0,
    ),
    step(
        HandshakeState::SignalOctDone,
        Action::SetBits {
            addr: CORE2SEQ_ADDR,
            mask: OCT_DONE,
        },
        0,
    ),
    step(
        HandshakeState::WaitEmifRequest,
        poll(
            SEQ2CORE_ADDR,
            emif_oct_request,
            true,
            2_000_000,
            HandshakeError::EmifRequestTimeout,
        ),
        0,
    ),
    step(
        HandshakeState::AckEmifRequest,
        Action::ClearBits {
            addr: CORE2SEQ_ADDR,
            mask: OCT_DONE,
        },
        0,
    ),
    step(
        HandshakeState::WaitEmifRelease,
        poll(
            SEQ2CORE_ADDR,
            emif_oct_request,
            false,
            2_000_000,
            HandshakeError::EmifReleaseTimeout,
        ),
        0,
    ),
    step(
        HandshakeState::TriggerOctCal,
        Action::SetBits {
            addr: GPO_ADDR,
            mask: OCT_CAL_REQUEST,
        },
        0,
    ),
    step(
        HandshakeState::WaitOctBusy,
        poll(
            GPI_ADDR,
            oct_cal_ready,
            false,
            1_000,
            HandshakeError::OctBusyTimeout,
        ),
        0,
    ),
    step(
        HandshakeState::ReleaseOctRequest,
        Action::ClearBits {
            addr: GPO_ADDR,
            mask: OCT_CAL_REQUEST,
        },
        0,
    ),
    step(
        HandshakeState::WaitOctComplete,
        poll(
            GPI_ADDR,
            oct_cal_ready,
            true,
            200_000,
            HandshakeError::OctCalTimeout,
        ),
        0,
    ),
    step(
        HandshakeState::ProceedEmifCal,
        Action::SetBits {
            addr: CORE2SEQ_ADDR,
            mask: OCT_DONE,
        },
        100,
    ),
];

/// Runs one complete OCT calibration handshake.
///
/// Every step either completes or fails with the [HandshakeError] of the wait which timed out.
/// On success, the EMIF sequencer proceeds with the memory calibration on its own; completion is
/// reported through the HMC calibration status register.
pub fn run_handshake<P: RegisterPort, D: DelayNs, W: Watchdog>(
    bus: &mut RegisterBus<P, D, W>,
) -> Result<(), HandshakeError> {
    for transition in SEQUENCE.iter() {
        log::trace!("OCT handshake: {:?}", transition.state);
        match transition.action {
            Action::Delay { ms } => bus.delay_ms(ms),
            Action::Write { addr, value } => bus.write(addr, value),
            Action::SetBits { addr, mask } => bus.set_bits(addr, mask),
            Action::ClearBits { addr, mask } => bus.clear_bits(addr, mask),
            Action::Poll {
                addr,
                signal,
                expected,
                timeout_us,
                error,
            } => {
                if !bus.poll(addr, timeout_us, |value| signal(value) == expected) {
                    log::warn!("OCT handshake timeout in {:?}: {}", transition.state, error);
                    return Err(error);
                }
            }
        }
        if transition.settle_ms > 0 {
            bus.delay_ms(transition.settle_ms);
        }
    }
    Ok(())
}
