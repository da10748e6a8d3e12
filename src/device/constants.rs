use crate::device::types::DeviceIdentity;

/**
 * How often (milliseconds) the monitor loop checks whether the button is (still) attached.
 */
pub const DEVICE_CHECK_INTERVAL: u64 = 3000;

/**
 * How long (milliseconds) to wait before retrying a button that was found but could not be opened.
 */
pub const OPEN_RETRY_DELAY: u64 = 5000;

/**
 * How long (milliseconds) a single report read may block. Cancellation is checked in between reads.
 */
pub const READ_TIMEOUT: u64 = 100;

/**
 * How long (milliseconds) each color is shown by the cycle-colors diagnostic.
 */
pub const CYCLE_STEP_DELAY: u64 = 500;

/**
 * Vendor/product pairs of the supported buttons. Any of these will do; the first one enumerated wins.
 * 0x20a0 is the MuteMe original, 0x3603 the MuteMe Mini.
 */
pub const KNOWN_DEVICES: [DeviceIdentity; 6] = [
    DeviceIdentity { vendor_id: 0x20a0, product_id: 0x42da },
    DeviceIdentity { vendor_id: 0x20a0, product_id: 0x42db },
    DeviceIdentity { vendor_id: 0x3603, product_id: 0x0001 },
    DeviceIdentity { vendor_id: 0x3603, product_id: 0x0002 },
    DeviceIdentity { vendor_id: 0x3603, product_id: 0x0003 },
    DeviceIdentity { vendor_id: 0x3603, product_id: 0x0004 },
];

/**
 * Size of an inbound touch report, and the offset of the byte that carries the touch code.
 */
pub const REPORT_LENGTH: usize = 8;
pub const REPORT_CODE_OFFSET: usize = 4;

pub const REPORT_CODE_IDLE: u8 = 0;
pub const REPORT_CODE_TOUCH_DOWN: u8 = 1;
pub const REPORT_CODE_TOUCH_UP: u8 = 2;

/**
 * Outbound commands are `[COMMAND_REPORT_ID, color_code + mode_code]`.
 */
pub const COMMAND_REPORT_ID: u8 = 0x00;
