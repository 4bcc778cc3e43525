use reil::{ReilFunction, ReilInstruction};

use crate::emitter::Emitter;
use crate::{Environment, Instruction, Mnemonic, ParsedMnemonic, Result};

mod arithmetic;
mod bits;
mod control;
mod logic;
mod shift;
mod stack;
mod string;
mod system;
mod transfer;

/// Translate a native instruction into REIL and append it to `out`.
///
/// The REIL instructions are addressed by the native instruction's address and their position in
/// the translation. On error nothing is appended.
pub fn translate(
    environment: &mut Environment,
    instruction: &Instruction,
    out: &mut Vec<ReilInstruction>,
) -> Result<()> {
    let parsed: ParsedMnemonic = instruction.mnemonic.parse()?;
    let mut emitter = Emitter::new(environment, instruction);
    dispatch(&mut emitter, &parsed)?;

    let translated = emitter.finish()?;
    tracing::debug!(
        address = format_args!("{:#x}", instruction.address),
        mnemonic = %instruction.mnemonic,
        count = translated.len(),
        "translated instruction"
    );

    out.extend(translated);
    Ok(())
}

/// Translate a sequence of native instructions into a REIL function.
pub fn translate_function<'a>(
    environment: &mut Environment,
    instructions: impl IntoIterator<Item = &'a Instruction>,
) -> Result<ReilFunction> {
    let mut out = Vec::new();
    for instruction in instructions {
        translate(environment, instruction, &mut out)?;
    }

    Ok(ReilFunction::from_instructions(out)?)
}

fn dispatch(e: &mut Emitter<'_>, parsed: &ParsedMnemonic) -> Result<()> {
    use arithmetic::{Carry, Direction};

    match parsed.mnemonic {
        Mnemonic::Add => arithmetic::add_sub(e, Direction::Add, Carry::Ignore, true),
        Mnemonic::Adc => arithmetic::add_sub(e, Direction::Add, Carry::Use, true),
        Mnemonic::Sub => arithmetic::add_sub(e, Direction::Sub, Carry::Ignore, true),
        Mnemonic::Sbb => arithmetic::add_sub(e, Direction::Sub, Carry::Use, true),
        Mnemonic::Cmp => arithmetic::add_sub(e, Direction::Sub, Carry::Ignore, false),
        Mnemonic::Inc => arithmetic::inc_dec(e, Direction::Add),
        Mnemonic::Dec => arithmetic::inc_dec(e, Direction::Sub),
        Mnemonic::Neg => arithmetic::neg(e),
        Mnemonic::Xadd => arithmetic::xadd(e),
        Mnemonic::Cmpxchg => arithmetic::cmpxchg(e),
        Mnemonic::Mul => arithmetic::mul(e),
        Mnemonic::Imul => arithmetic::imul(e),
        Mnemonic::Div => arithmetic::div(e),
        Mnemonic::Idiv => arithmetic::idiv(e),
        Mnemonic::And => logic::binary(e, reil::Opcode::And, true),
        Mnemonic::Or => logic::binary(e, reil::Opcode::Or, true),
        Mnemonic::Xor => logic::binary(e, reil::Opcode::Xor, true),
        Mnemonic::Test => logic::binary(e, reil::Opcode::And, false),
        Mnemonic::Not => logic::not(e),
        Mnemonic::Shl => shift::shift(e, shift::Kind::Left),
        Mnemonic::Shr => shift::shift(e, shift::Kind::LogicalRight),
        Mnemonic::Sar => shift::shift(e, shift::Kind::ArithmeticRight),
        Mnemonic::Rol => shift::rotate(e, shift::Rotation::Left),
        Mnemonic::Ror => shift::rotate(e, shift::Rotation::Right),
        Mnemonic::Rcl => shift::rotate_carry(e, shift::Rotation::Left),
        Mnemonic::Rcr => shift::rotate_carry(e, shift::Rotation::Right),
        Mnemonic::Shld => shift::double(e, shift::Rotation::Left),
        Mnemonic::Shrd => shift::double(e, shift::Rotation::Right),
        Mnemonic::Bsf => bits::scan(e, bits::Scan::Forward),
        Mnemonic::Bsr => bits::scan(e, bits::Scan::Reverse),
        Mnemonic::Bt => bits::test(e, None),
        Mnemonic::Btc => bits::test(e, Some(reil::Opcode::Xor)),
        Mnemonic::Btr => bits::test(e, Some(reil::Opcode::And)),
        Mnemonic::Bts => bits::test(e, Some(reil::Opcode::Or)),
        Mnemonic::Bswap => bits::bswap(e),
        Mnemonic::Mov => transfer::mov(e),
        Mnemonic::Movsx | Mnemonic::Movsxd => transfer::movsx(e),
        Mnemonic::Movzx => transfer::movzx(e),
        Mnemonic::Lea => transfer::lea(e),
        Mnemonic::Xchg => transfer::xchg(e),
        Mnemonic::Cmov(condition) => transfer::cmov(e, condition),
        Mnemonic::Set(condition) => transfer::set(e, condition),
        Mnemonic::Cbw => transfer::extend_accumulator(e, "al", "ax"),
        Mnemonic::Cwde => transfer::extend_accumulator(e, "ax", "eax"),
        Mnemonic::Cdqe => transfer::extend_accumulator(e, "eax", "rax"),
        Mnemonic::Cwd => transfer::extend_into_data(e, "ax", "dx"),
        Mnemonic::Cdq => transfer::cdq(e),
        Mnemonic::Cqo => transfer::extend_into_data(e, "rax", "rdx"),
        Mnemonic::Lahf => transfer::lahf(e),
        Mnemonic::Sahf => transfer::sahf(e),
        Mnemonic::Xlat => transfer::xlat(e),
        Mnemonic::Nop => {
            e.nop();
            Ok(())
        }
        Mnemonic::Clc => system::set_flag(e, crate::flags::CARRY, false),
        Mnemonic::Stc => system::set_flag(e, crate::flags::CARRY, true),
        Mnemonic::Cmc => system::complement_carry(e),
        Mnemonic::Cld => system::set_flag(e, crate::flags::DIRECTION, false),
        Mnemonic::Std => system::set_flag(e, crate::flags::DIRECTION, true),
        Mnemonic::Cli => system::set_flag(e, crate::flags::INTERRUPT, false),
        Mnemonic::Sti => system::set_flag(e, crate::flags::INTERRUPT, true),
        Mnemonic::Pushf(size) => stack::pushf(e, size),
        Mnemonic::Popf(size) => stack::popf(e, size),
        Mnemonic::Push => stack::push(e),
        Mnemonic::Pop => stack::pop(e),
        Mnemonic::Pusha(size) => stack::pusha(e, size),
        Mnemonic::Popa(size) => stack::popa(e, size),
        Mnemonic::Leave => stack::leave(e),
        Mnemonic::Call => stack::call(e),
        Mnemonic::Ret => stack::ret(e),
        Mnemonic::Jmp => control::jmp(e),
        Mnemonic::Jcc(condition) => control::jcc(e, condition),
        Mnemonic::Jcxz(size) => control::jcxz(e, size),
        Mnemonic::Loop => control::loop_(e, None),
        Mnemonic::Loope => control::loop_(e, Some(crate::Condition::E)),
        Mnemonic::Loopne => control::loop_(e, Some(crate::Condition::Ne)),
        Mnemonic::String(operation, size) => string::string(e, operation, size, parsed.repeat()),
        Mnemonic::System => system::unknown(e),
    }
}
