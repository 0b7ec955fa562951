/// Boot sector written at offset 0 of every newly created image.
///
/// The parameter block embedded at 0x0B describes the 2HD preset; image
/// creation overwrites it with the selected geometry.
pub const BOOT_SECTOR: [u8; BOOT_SECTOR_SIZE] = [
    0x60, 0x3C, 0x90, 0x58, 0x36, 0x38, 0x49, 0x50, 0x4C, 0x33, 0x30, 0x00, 0x04, 0x01, 0x01, 0x00,
    0x02, 0xC0, 0x00, 0xD0, 0x04, 0xFE, 0x02, 0x00, 0x08, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x20, 0x20, 0x20, 0x20, 0x20,
    0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x46, 0x41, 0x54, 0x31, 0x32, 0x20, 0x20, 0x20, 0x4F, 0xFA,
    0xFF, 0xC0, 0x4D, 0xFA, 0x01, 0xB8, 0x4B, 0xFA, 0x00, 0xE0, 0x49, 0xFA, 0x00, 0xEA, 0x43, 0xFA,
    0x01, 0x20, 0x4E, 0x94, 0x70, 0x8E, 0x4E, 0x4F, 0x7E, 0x70, 0xE1, 0x48, 0x8E, 0x40, 0x26, 0x3A,
    0x01, 0x02, 0x22, 0x4E, 0x24, 0x3A, 0x01, 0x00, 0x32, 0x07, 0x4E, 0x95, 0x66, 0x28, 0x22, 0x4E,
    0x32, 0x3A, 0x00, 0xFA, 0x20, 0x49, 0x45, 0xFA, 0x01, 0x78, 0x70, 0x0A, 0x00, 0x10, 0x00, 0x20,
    0xB1, 0x0A, 0x56, 0xC8, 0xFF, 0xF8, 0x67, 0x38, 0xD2, 0xFC, 0x00, 0x20, 0x51, 0xC9, 0xFF, 0xE6,
    0x45, 0xFA, 0x00, 0xE0, 0x60, 0x10, 0x45, 0xFA, 0x00, 0xFA, 0x60, 0x0A, 0x45, 0xFA, 0x01, 0x10,
    0x60, 0x04, 0x45, 0xFA, 0x01, 0x28, 0x61, 0x00, 0x00, 0x94, 0x22, 0x4A, 0x4C, 0x99, 0x00, 0x06,
    0x70, 0x23, 0x4E, 0x4F, 0x4E, 0x94, 0x32, 0x07, 0x70, 0x4F, 0x4E, 0x4F, 0x70, 0xFE, 0x4E, 0x4F,
    0x74, 0x00, 0x34, 0x29, 0x00, 0x1A, 0xE1, 0x5A, 0xD4, 0x7A, 0x00, 0xA4, 0x84, 0xFA, 0x00, 0x9C,
    0x84, 0x7A, 0x00, 0x94, 0xE2, 0x0A, 0x64, 0x04, 0x08, 0xC2, 0x00, 0x18, 0x48, 0x42, 0x52, 0x02,
    0x22, 0x4E, 0x26, 0x3A, 0x00, 0x7E, 0x32, 0x07, 0x4E, 0x95, 0x34, 0x7C, 0x68, 0x00, 0x22, 0x4E,
    0x0C, 0x59, 0x48, 0x55, 0x66, 0xA6, 0x54, 0x89, 0xB5, 0xD9, 0x66, 0xA6, 0x2F, 0x19, 0x20, 0x59,
    0xD1, 0xD9, 0x2F, 0x08, 0x2F, 0x11, 0x32, 0x7C, 0x67, 0xC0, 0x76, 0x40, 0xD6, 0x88, 0x4E, 0x95,
    0x22, 0x1F, 0x24, 0x1F, 0x22, 0x5F, 0x4A, 0x80, 0x66, 0x00, 0xFF, 0x7C, 0xD5, 0xC2, 0x53, 0x81,
    0x65, 0x04, 0x42, 0x1A, 0x60, 0xF8, 0x4E, 0xD1, 0x70, 0x46, 0x4E, 0x4F, 0x08, 0x00, 0x00, 0x1E,
    0x66, 0x02, 0x70, 0x00, 0x4E, 0x75, 0x70, 0x21, 0x4E, 0x4F, 0x4E, 0x75, 0x72, 0x0F, 0x70, 0x22,
    0x4E, 0x4F, 0x72, 0x19, 0x74, 0x0C, 0x70, 0x23, 0x4E, 0x4F, 0x61, 0x08, 0x72, 0x19, 0x74, 0x0D,
    0x70, 0x23, 0x4E, 0x4F, 0x76, 0x2C, 0x72, 0x20, 0x70, 0x20, 0x4E, 0x4F, 0x51, 0xCB, 0xFF, 0xF8,
    0x4E, 0x75, 0x00, 0x00, 0x04, 0x00, 0x03, 0x00, 0x00, 0x06, 0x00, 0x08, 0x00, 0x1F, 0x00, 0x09,
    0x1A, 0x00, 0x00, 0x22, 0x00, 0x0D, 0x48, 0x75, 0x6D, 0x61, 0x6E, 0x2E, 0x73, 0x79, 0x73, 0x20,
    0x82, 0xAA, 0x20, 0x8C, 0xA9, 0x82, 0xC2, 0x82, 0xA9, 0x82, 0xE8, 0x82, 0xDC, 0x82, 0xB9, 0x82,
    0xF1, 0x00, 0x00, 0x25, 0x00, 0x0D, 0x83, 0x66, 0x83, 0x42, 0x83, 0x58, 0x83, 0x4E, 0x82, 0xAA,
    0x81, 0x40, 0x93, 0xC7, 0x82, 0xDF, 0x82, 0xDC, 0x82, 0xB9, 0x82, 0xF1, 0x00, 0x00, 0x00, 0x23,
    0x00, 0x0D, 0x48, 0x75, 0x6D, 0x61, 0x6E, 0x2E, 0x73, 0x79, 0x73, 0x20, 0x82, 0xAA, 0x20, 0x89,
    0xF3, 0x82, 0xEA, 0x82, 0xC4, 0x82, 0xA2, 0x82, 0xDC, 0x82, 0xB7, 0x00, 0x00, 0x20, 0x00, 0x0D,
    0x48, 0x75, 0x6D, 0x61, 0x6E, 0x2E, 0x73, 0x79, 0x73, 0x20, 0x82, 0xCC, 0x20, 0x83, 0x41, 0x83,
    0x68, 0x83, 0x8C, 0x83, 0x58, 0x82, 0xAA, 0x88, 0xD9, 0x8F, 0xED, 0x82, 0xC5, 0x82, 0xB7, 0x00,
    0x68, 0x75, 0x6D, 0x61, 0x6E, 0x20, 0x20, 0x20, 0x73, 0x79, 0x73, 0x00, 0x00, 0x00, 0x00, 0x00,
];

pub const BOOT_SECTOR_SIZE: usize = 512;

/// Replaces the first three bytes of the boot sector for 2HQ images.
pub const JUMP_2HQ: [u8; 3] = [0xEB, 0xFE, 0x90];
