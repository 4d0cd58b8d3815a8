//! # PAC for the SDRAM subsystem of the Arria 10 SoC
//!
//! Register block descriptions for everything touched while bringing the hard memory controller
//! (HMC) out of reset: the ECC/HMC control block, the IO48 memory mapped registers of the EMIF,
//! the NoC DDR scheduler and firewalls as well as the small set of system manager, reset manager
//! and FPGA manager registers involved in the EMIF calibration handshake.
//!
//! Every block provides a `new_mmio_fixed` constructor for direct register access and exports the
//! absolute addresses of the registers consumed by the HAL.
#![no_std]

pub mod ecc_hmc;
pub mod emif;
pub mod fpga_mgr;
pub mod io48_mmr;
pub mod noc_firewall;
pub mod noc_scheduler;
pub mod rstmgr;
pub mod sysmgr;
