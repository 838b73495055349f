//! Log forwarding.
//!
//! Hardware builds log through `defmt`, desktop builds through `tracing`.
//! With neither feature enabled the arguments are borrowed and discarded.
//! Only `{}` placeholders are used so one format string serves both
//! backends; arguments must implement both `defmt::Format` and `Display`.

macro_rules! hal_trace {
    ($s:literal $(, $x:expr)* $(,)?) => {{
        #[cfg(feature = "defmt")]
        defmt::trace!($s $(, $x)*);
        #[cfg(feature = "tracing")]
        tracing::trace!($s $(, $x)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        let _ = ($(&$x),*);
    }};
}

macro_rules! hal_debug {
    ($s:literal $(, $x:expr)* $(,)?) => {{
        #[cfg(feature = "defmt")]
        defmt::debug!($s $(, $x)*);
        #[cfg(feature = "tracing")]
        tracing::debug!($s $(, $x)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        let _ = ($(&$x),*);
    }};
}

macro_rules! hal_warn {
    ($s:literal $(, $x:expr)* $(,)?) => {{
        #[cfg(feature = "defmt")]
        defmt::warn!($s $(, $x)*);
        #[cfg(feature = "tracing")]
        tracing::warn!($s $(, $x)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        let _ = ($(&$x),*);
    }};
}

pub(crate) use hal_debug;
pub(crate) use hal_trace;
pub(crate) use hal_warn;
