//! Linux uinput backend.
//!
//! Devices are registered through the `evdev` crate's uinput builder.  Event
//! writes bypass `VirtualDevice::emit`, which appends its own `SYN_REPORT`,
//! and go straight to the uinput file descriptor: framing belongs to
//! [`VirtualGamepad`](joypad_core::VirtualGamepad), which writes the sync
//! marker itself.
//!
//! # Permissions
//!
//! Opening `/dev/uinput` normally requires root or membership of a group with
//! write access (often `input` or `uinput`, set up by a udev rule).  Without
//! it, creation fails with `PermissionDenied` before anything is registered.

use std::io;
use std::mem;
use std::os::fd::AsRawFd;

use evdev::uinput::VirtualDevice;
use evdev::{AbsInfo, AbsoluteAxisCode, AttributeSet, KeyCode, UinputAbsSetup};
use tracing::debug;

use joypad_core::device::DeviceSpec;
use joypad_core::{DeviceBackend, DeviceError, EventSink, RawEvent};

/// Creates virtual gamepads through `/dev/uinput`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UinputBackend;

impl UinputBackend {
    pub fn new() -> Self {
        Self
    }
}

impl DeviceBackend for UinputBackend {
    fn create(&self, spec: &DeviceSpec) -> Result<Box<dyn EventSink>, DeviceError> {
        let creation = |step: &'static str| {
            let name = spec.name.clone();
            move |source: io::Error| DeviceError::Creation { name, step, source }
        };

        // Dropping the builder on any early return closes the uinput handle,
        // so nothing is left registered.
        let mut builder = VirtualDevice::builder()
            .map_err(creation("opening /dev/uinput"))?
            .name(&spec.name);

        let range = spec.range;
        for axis in &spec.axes {
            let info = AbsInfo::new(
                0,
                range.minimum,
                range.maximum,
                range.fuzz,
                range.flat,
                range.resolution,
            );
            let setup = UinputAbsSetup::new(AbsoluteAxisCode(axis.code()), info);
            builder = builder
                .with_absolute_axis(&setup)
                .map_err(creation("enabling absolute axis"))?;
        }

        if !spec.buttons.is_empty() {
            let mut keys = AttributeSet::<KeyCode>::new();
            for button in &spec.buttons {
                keys.insert(KeyCode::new(button.code()));
            }
            builder = builder
                .with_keys(&keys)
                .map_err(creation("enabling buttons"))?;
        }

        let device = builder.build().map_err(creation("registering device"))?;
        debug!("uinput device '{}' registered", spec.name);
        Ok(Box::new(UinputSink { device }))
    }
}

struct UinputSink {
    device: VirtualDevice,
}

impl EventSink for UinputSink {
    fn write_event(&mut self, event: RawEvent) -> io::Result<()> {
        // SAFETY: `input_event` is plain data; all-zero is a valid value and
        // a zero timestamp tells the kernel to stamp the event itself.
        let mut raw: libc::input_event = unsafe { mem::zeroed() };
        raw.type_ = event.event_type;
        raw.code = event.code;
        raw.value = event.value;

        let size = mem::size_of::<libc::input_event>();
        // SAFETY: `raw` outlives the call and `size` is exactly its size; the
        // fd belongs to `self.device`, which is alive for the whole call.
        let written = unsafe {
            libc::write(
                self.device.as_raw_fd(),
                (&raw as *const libc::input_event).cast(),
                size,
            )
        };
        if written < 0 {
            return Err(io::Error::last_os_error());
        }
        if written as usize != size {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "short write to uinput",
            ));
        }
        Ok(())
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        // Closing the uinput fd destroys the device registration.
        drop(self.device);
        Ok(())
    }
}
