use reil::OperandSize;

use crate::*;

#[test]
fn little_endian() -> Result<()> {
    let mut memory = Memory::new(Endianness::Little);
    memory.store(0x100, 0x8877665544332211, OperandSize::Qword);

    assert_eq!(memory.len(), 8);
    assert_eq!(memory.load(0x100, OperandSize::Byte)?, 0x11);
    assert_eq!(memory.load(0x102, OperandSize::Word)?, 0x4433);
    assert_eq!(memory.load(0x100, OperandSize::Qword)?, 0x8877665544332211);
    Ok(())
}

#[test]
fn big_endian() -> Result<()> {
    let mut memory = Memory::new(Endianness::Big);
    memory.store(0x100, 0x11223344, OperandSize::Dword);

    assert_eq!(memory.load(0x100, OperandSize::Byte)?, 0x11);
    assert_eq!(memory.load(0x102, OperandSize::Word)?, 0x3344);
    assert_eq!(memory.load(0x100, OperandSize::Dword)?, 0x11223344);
    Ok(())
}

#[test]
fn overwrite_part_of_value() -> Result<()> {
    let mut memory = Memory::new(Endianness::Little);
    memory.store(0, 0xbebe, OperandSize::Word);
    memory.store(0, 0xef, OperandSize::Byte);

    assert_eq!(memory.load(0, OperandSize::Word)?, 0xbeef);
    Ok(())
}

#[test]
fn unmapped_bytes() {
    let mut memory = Memory::new(Endianness::Little);
    memory.store(0x10, 0xff, OperandSize::Byte);

    assert_eq!(
        memory.load(0x10, OperandSize::Dword),
        Err(Error::UnmappedMemory {
            address: 0x10,
            relative_offset: 1,
        })
    );
    assert_eq!(
        memory.load(0x20, OperandSize::Byte),
        Err(Error::UnmappedMemory {
            address: 0x20,
            relative_offset: 0,
        })
    );
}

#[test]
fn addresses_wrap() -> Result<()> {
    let mut memory = Memory::new(Endianness::Little);
    memory.store(u64::MAX, 0x2211, OperandSize::Word);

    assert!(memory.is_defined(u64::MAX));
    assert!(memory.is_defined(0));
    assert_eq!(memory.load(u64::MAX, OperandSize::Word)?, 0x2211);
    Ok(())
}
