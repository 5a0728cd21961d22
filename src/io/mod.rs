// External collaborators of the brightness engine
pub mod backlight; // Brightness sinks (sysfs backlight, log, recording)
pub mod dbus; // systemd-logind lock/unlock and sleep monitoring
pub mod events; // Event type and text parser
pub mod sensor; // IIO light sensor and stdin event source
pub mod signals; // Unix signal handling
