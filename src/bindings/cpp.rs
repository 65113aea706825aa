use crate::config::{BandConfig, Config, ProcessorConfig};
use crate::error::FilterError;
use crate::processing::Processor;

use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_void};

// Status codes returned to the host
pub const BANDPASS_OK: c_int = 0;
pub const BANDPASS_INVALID_SPECIFICATION: c_int = 1;
pub const BANDPASS_CHANNEL_COUNT_MISMATCH: c_int = 2;
pub const BANDPASS_NUMERIC_INSTABILITY: c_int = 3;
pub const BANDPASS_NOT_CONFIGURED: c_int = 4;
pub const BANDPASS_SESSION_FAULTED: c_int = 5;
pub const BANDPASS_NULL_POINTER: c_int = -1;

fn status(result: Result<(), FilterError>) -> c_int {
    match result {
        Ok(()) => BANDPASS_OK,
        Err(FilterError::InvalidSpecification(_)) => BANDPASS_INVALID_SPECIFICATION,
        Err(FilterError::ChannelCountMismatch { .. }) => BANDPASS_CHANNEL_COUNT_MISMATCH,
        Err(FilterError::NumericInstability { .. }) => BANDPASS_NUMERIC_INSTABILITY,
        Err(FilterError::NotConfigured) => BANDPASS_NOT_CONFIGURED,
        Err(FilterError::SessionFaulted) => BANDPASS_SESSION_FAULTED,
    }
}

// One channel row owned by the host for the duration of a call.
struct HostChannel {
    data: *mut f32,
    len: usize,
}

// Rows are disjoint host allocations, so handing them to worker threads is
// sound for the duration of `bandpass_on_buffer`.
unsafe impl Send for HostChannel {}

impl AsMut<[f32]> for HostChannel {
    fn as_mut(&mut self) -> &mut [f32] {
        if self.len == 0 {
            return &mut [];
        }
        unsafe { std::slice::from_raw_parts_mut(self.data, self.len) }
    }
}

pub struct ProcessorFFI {
    processor: Processor,
    // Reused every buffer so the steady-state path does not allocate
    channels: Vec<HostChannel>,
}

#[no_mangle]
pub extern "C" fn create_bandpass_processor(
    order: usize,
    f_low: f64,
    f_high: f64,
    parallel_channels: bool,
) -> *mut c_void {
    let config = Config {
        band: BandConfig {
            order,
            f_low,
            f_high,
        },
        processor: ProcessorConfig {
            parallel_channels,
            event_log: None,
        },
    };
    let boxed = Box::new(ProcessorFFI {
        processor: Processor::new(config),
        channels: Vec::new(),
    });
    Box::into_raw(boxed) as *mut c_void
}

#[no_mangle]
pub extern "C" fn delete_bandpass_processor(processor_ptr: *mut c_void) {
    if !processor_ptr.is_null() {
        unsafe {
            drop(Box::from_raw(processor_ptr as *mut ProcessorFFI));
        }
    }
}

unsafe fn processor_mut<'a>(processor_ptr: *mut c_void) -> Option<&'a mut ProcessorFFI> {
    (processor_ptr as *mut ProcessorFFI).as_mut()
}

#[no_mangle]
pub extern "C" fn bandpass_on_settings_changed(
    processor_ptr: *mut c_void,
    num_channels: usize,
    sample_rate: f64,
) -> c_int {
    let Some(ffi) = (unsafe { processor_mut(processor_ptr) }) else {
        return BANDPASS_NULL_POINTER;
    };
    let result = ffi.processor.on_settings_changed(num_channels, sample_rate);
    if result.is_ok() {
        ffi.channels.reserve(num_channels.saturating_sub(ffi.channels.len()));
    }
    status(result)
}

/// `data` points to `num_channels` row pointers, each `num_samples` long.
#[no_mangle]
pub extern "C" fn bandpass_on_buffer(
    processor_ptr: *mut c_void,
    data: *const *mut f32,
    num_channels: usize,
    num_samples: usize,
) -> c_int {
    let Some(ffi) = (unsafe { processor_mut(processor_ptr) }) else {
        return BANDPASS_NULL_POINTER;
    };
    if num_channels > 0 && data.is_null() {
        return BANDPASS_NULL_POINTER;
    }

    ffi.channels.clear();
    for c in 0..num_channels {
        let row = unsafe { *data.add(c) };
        if row.is_null() && num_samples > 0 {
            ffi.channels.clear();
            return BANDPASS_NULL_POINTER;
        }
        ffi.channels.push(HostChannel {
            data: row,
            len: num_samples,
        });
    }

    let result = ffi.processor.on_buffer(&mut ffi.channels);
    ffi.channels.clear();
    status(result)
}

#[no_mangle]
pub extern "C" fn bandpass_reset(processor_ptr: *mut c_void) -> c_int {
    let Some(ffi) = (unsafe { processor_mut(processor_ptr) }) else {
        return BANDPASS_NULL_POINTER;
    };
    ffi.processor.reset();
    BANDPASS_OK
}

#[no_mangle]
pub extern "C" fn bandpass_on_acquisition_start(processor_ptr: *mut c_void) -> c_int {
    let Some(ffi) = (unsafe { processor_mut(processor_ptr) }) else {
        return BANDPASS_NULL_POINTER;
    };
    ffi.processor.on_acquisition_start();
    BANDPASS_OK
}

#[no_mangle]
pub extern "C" fn bandpass_on_acquisition_stop(processor_ptr: *mut c_void) -> c_int {
    let Some(ffi) = (unsafe { processor_mut(processor_ptr) }) else {
        return BANDPASS_NULL_POINTER;
    };
    ffi.processor.on_acquisition_stop();
    BANDPASS_OK
}

#[no_mangle]
pub extern "C" fn bandpass_on_recording_start(
    processor_ptr: *mut c_void,
    recording_dir: *const c_char,
) -> c_int {
    let Some(ffi) = (unsafe { processor_mut(processor_ptr) }) else {
        return BANDPASS_NULL_POINTER;
    };
    if recording_dir.is_null() {
        return BANDPASS_NULL_POINTER;
    }
    // Borrowed, the host keeps ownership of the string
    let dir = unsafe { CStr::from_ptr(recording_dir) }.to_string_lossy();
    ffi.processor.on_recording_start(&*dir);
    BANDPASS_OK
}

#[no_mangle]
pub extern "C" fn bandpass_on_recording_stop(processor_ptr: *mut c_void) -> c_int {
    let Some(ffi) = (unsafe { processor_mut(processor_ptr) }) else {
        return BANDPASS_NULL_POINTER;
    };
    ffi.processor.on_recording_stop();
    BANDPASS_OK
}
