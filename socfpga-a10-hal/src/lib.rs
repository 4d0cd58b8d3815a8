//! # SDRAM bring-up HAL for the Arria 10 SoC
//!
//! This crate brings the hard memory controller of the Arria 10 hard processor system (HPS) from
//! reset into a calibrated and protected state during early boot. It builds on top of the
//! register descriptions of the [socfpga_a10] peripheral access crate.
//!
//! All hardware accesses go through the [regs::RegisterPort] trait, so the whole bring-up flow can
//! run against the real memory mapped registers via [regs::MmioPort] or against any other backend.
//!
//! The bring-up itself is driven by [sdram::bring_up]. The ECC fault handling is provided by
//! [sdram::ecc::EccInterruptHandler], which has to be registered with the interrupt controller by
//! the platform once memory is online.
#![cfg_attr(not(test), no_std)]

pub mod regs;
pub mod sdram;

#[cfg(test)]
pub(crate) mod sim;
