//! Register access primitives.
//!
//! No value is ever cached: every call results in a fresh access because the calibration
//! sequencer, the OCT state machine and interrupts change hardware state asynchronously.
use embedded_hal::delay::DelayNs;

/// Interval of all busy-wait polling loops.
pub const POLL_INTERVAL_US: u32 = 100;

/// Number of [POLL_INTERVAL_US] steps needed to cover the timeout, rounded up.
#[inline]
pub const fn poll_steps(timeout_us: u32) -> u32 {
    timeout_us.div_ceil(POLL_INTERVAL_US)
}

/// Raw 32 bit access to the physical register space.
pub trait RegisterPort {
    fn read(&mut self, addr: usize) -> u32;
    fn write(&mut self, addr: usize, value: u32);
}

impl<T: RegisterPort + ?Sized> RegisterPort for &mut T {
    #[inline]
    fn read(&mut self, addr: usize) -> u32 {
        T::read(self, addr)
    }

    #[inline]
    fn write(&mut self, addr: usize, value: u32) {
        T::write(self, addr, value)
    }
}

/// Volatile access to the memory mapped registers.
#[derive(Debug)]
pub struct MmioPort {
    _private: (),
}

impl MmioPort {
    /// # Safety
    ///
    /// Circumvents ownership of the register space. Multiple instances can perform
    /// read-modify-write sequences on the same registers, so the user must ensure that every
    /// register is only ever modified through one instance. The addresses passed to the port
    /// must be valid, aligned register addresses.
    pub const unsafe fn steal() -> Self {
        Self { _private: () }
    }
}

impl RegisterPort for MmioPort {
    #[inline]
    fn read(&mut self, addr: usize) -> u32 {
        // Safety: See constructor.
        unsafe { core::ptr::read_volatile(addr as *const u32) }
    }

    #[inline]
    fn write(&mut self, addr: usize, value: u32) {
        // Safety: See constructor.
        unsafe { core::ptr::write_volatile(addr as *mut u32, value) }
    }
}

/// Platform watchdog which must be serviced inside every blocking wait.
pub trait Watchdog {
    fn feed(&mut self);
}

/// For platforms which do not run a watchdog during early boot.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoWatchdog;

impl Watchdog for NoWatchdog {
    #[inline]
    fn feed(&mut self) {}
}

/// Register port together with the delay provider and watchdog required by the polling
/// primitives.
///
/// The read-modify-write helpers are not atomic with respect to interrupts. Registers modified
/// through this bus must not be modified from interrupt context at the same time.
pub struct RegisterBus<P, D, W> {
    port: P,
    delay: D,
    watchdog: W,
}

impl<P: RegisterPort, D: DelayNs, W: Watchdog> RegisterBus<P, D, W> {
    pub const fn new(port: P, delay: D, watchdog: W) -> Self {
        Self {
            port,
            delay,
            watchdog,
        }
    }

    #[inline]
    pub fn read(&mut self, addr: usize) -> u32 {
        self.port.read(addr)
    }

    #[inline]
    pub fn write(&mut self, addr: usize, value: u32) {
        self.port.write(addr, value)
    }

    #[inline]
    pub fn modify(&mut self, addr: usize, f: impl FnOnce(u32) -> u32) {
        let value = self.port.read(addr);
        self.port.write(addr, f(value));
    }

    #[inline]
    pub fn set_bits(&mut self, addr: usize, mask: u32) {
        self.modify(addr, |value| value | mask);
    }

    #[inline]
    pub fn clear_bits(&mut self, addr: usize, mask: u32) {
        self.modify(addr, |value| value & !mask);
    }

    #[inline]
    pub fn set_bit(&mut self, addr: usize, bit: u32) {
        self.set_bits(addr, 1 << bit);
    }

    #[inline]
    pub fn clear_bit(&mut self, addr: usize, bit: u32) {
        self.clear_bits(addr, 1 << bit);
    }

    #[inline]
    pub fn read_bit(&mut self, addr: usize, bit: u32) -> bool {
        (self.port.read(addr) >> bit) & 0b1 == 1
    }

    /// Busy-waits until the register value satisfies `done`.
    ///
    /// The register is sampled after every [POLL_INTERVAL_US] step and the watchdog is fed in
    /// every step. Returns `false` if the condition was not met within the timeout.
    pub fn poll(
        &mut self,
        addr: usize,
        timeout_us: u32,
        mut done: impl FnMut(u32) -> bool,
    ) -> bool {
        for _ in 0..poll_steps(timeout_us) {
            self.delay.delay_us(POLL_INTERVAL_US);
            self.watchdog.feed();
            if done(self.port.read(addr)) {
                return true;
            }
        }
        false
    }

    /// Busy-waits until the given bit has the expected value, see [Self::poll].
    pub fn poll_bit(&mut self, addr: usize, bit: u32, expected: bool, timeout_us: u32) -> bool {
        self.poll(addr, timeout_us, |value| ((value >> bit) & 0b1 == 1) == expected)
    }

    /// Delay in steps of one millisecond, feeding the watchdog after each step.
    pub fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            self.delay.delay_us(1000);
            self.watchdog.feed();
        }
    }

    #[inline]
    pub fn feed_watchdog(&mut self) {
        self.watchdog.feed();
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }

    pub fn watchdog(&self) -> &W {
        &self.watchdog
    }

    pub fn release(self) -> (P, D, W) {
        (self.port, self.delay, self.watchdog)
    }
}
