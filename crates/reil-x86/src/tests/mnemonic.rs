use reil::OperandSize;

use crate::*;

#[test]
fn prefixes() -> Result<()> {
    let parsed: ParsedMnemonic = "rep movsb".parse()?;
    assert_eq!(parsed.prefixes, vec![Prefix::Rep]);
    assert_eq!(
        parsed.mnemonic,
        Mnemonic::String(StringOperation::Movs, Some(OperandSize::Byte))
    );
    assert_eq!(parsed.repeat(), Some(Prefix::Rep));

    let parsed: ParsedMnemonic = "REPNZ SCASD".parse()?;
    assert_eq!(parsed.repeat(), Some(Prefix::Repne));
    assert_eq!(
        parsed.mnemonic,
        Mnemonic::String(StringOperation::Scas, Some(OperandSize::Dword))
    );

    let parsed: ParsedMnemonic = "lock xadd".parse()?;
    assert_eq!(parsed.prefixes, vec![Prefix::Lock]);
    assert_eq!(parsed.repeat(), None);
    assert_eq!(parsed.mnemonic, Mnemonic::Xadd);

    Ok(())
}

#[test]
fn condition_aliases() -> Result<()> {
    assert_eq!("cmovnz".parse::<Mnemonic>()?, Mnemonic::Cmov(Condition::Ne));
    assert_eq!("setnae".parse::<Mnemonic>()?, Mnemonic::Set(Condition::B));
    assert_eq!("jpo".parse::<Mnemonic>()?, Mnemonic::Jcc(Condition::Np));
    assert_eq!("jnle".parse::<Mnemonic>()?, Mnemonic::Jcc(Condition::G));
    assert_eq!("jc".parse::<Mnemonic>()?, Mnemonic::Jcc(Condition::B));
    Ok(())
}

#[test]
fn exact_names_take_precedence() -> Result<()> {
    assert_eq!("movsx".parse::<Mnemonic>()?, Mnemonic::Movsx);
    assert_eq!("movsxd".parse::<Mnemonic>()?, Mnemonic::Movsxd);
    assert_eq!("jmp".parse::<Mnemonic>()?, Mnemonic::Jmp);
    assert_eq!("jecxz".parse::<Mnemonic>()?, Mnemonic::Jcxz(OperandSize::Dword));
    assert_eq!("cmp".parse::<Mnemonic>()?, Mnemonic::Cmp);
    assert_eq!(
        "cmps".parse::<Mnemonic>()?,
        Mnemonic::String(StringOperation::Cmps, None)
    );
    assert_eq!("sal".parse::<Mnemonic>()?, Mnemonic::Shl);
    Ok(())
}

#[test]
fn unsupported() {
    assert_eq!(
        "fadd".parse::<Mnemonic>(),
        Err(Error::UnsupportedMnemonic("fadd".to_owned()))
    );
    assert_eq!(
        "jzz".parse::<Mnemonic>(),
        Err(Error::UnsupportedMnemonic("jzz".to_owned()))
    );
    assert_eq!(
        "bogus movsb".parse::<ParsedMnemonic>(),
        Err(Error::UnsupportedMnemonic("bogus movsb".to_owned()))
    );
    assert!("".parse::<ParsedMnemonic>().is_err());
}

#[test]
fn negation_is_an_involution() {
    let conditions = [
        Condition::O,
        Condition::B,
        Condition::E,
        Condition::Be,
        Condition::S,
        Condition::P,
        Condition::L,
        Condition::Le,
    ];

    for condition in conditions {
        assert_ne!(condition.negate(), condition);
        assert_eq!(condition.negate().negate(), condition);
    }
}
