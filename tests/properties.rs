//! Property tests for instruction semantics.

use dcpu16::cpu::decode::{encode, BasicOp};
use dcpu16::{Cpu, Instruction, Operand, Reg, Step};
use proptest::prelude::*;

fn basic(op: BasicOp, a: Operand, b: Operand) -> u16 {
    encode(&Instruction::Basic { op, a, b })
}

/// Run `op A, B` with A = a and B = b preloaded.
fn exec_ab(op: BasicOp, a: u16, b: u16) -> Cpu {
    let mut cpu = Cpu::new();
    cpu.regs[Reg::A] = a;
    cpu.regs[Reg::B] = b;
    cpu.load_program(&[basic(op, Operand::Register(Reg::A), Operand::Register(Reg::B))])
        .unwrap();
    cpu.step().unwrap();
    cpu
}

proptest! {
    #[test]
    fn add_wraps_and_sets_overflow(a: u16, b: u16) {
        let cpu = exec_ab(BasicOp::Add, a, b);
        let sum = a as u32 + b as u32;
        prop_assert_eq!(cpu.regs[Reg::A] as u32, sum % 65536);
        prop_assert_eq!(cpu.regs.o as u32, sum / 65536);
    }

    #[test]
    fn sub_wraps_and_flags_borrow(a: u16, b: u16) {
        let cpu = exec_ab(BasicOp::Sub, a, b);
        prop_assert_eq!(cpu.regs[Reg::A], a.wrapping_sub(b));
        prop_assert_eq!(cpu.regs.o, if b > a { 0xFFFF } else { 0 });
    }

    #[test]
    fn mul_splits_product(a: u16, b: u16) {
        let cpu = exec_ab(BasicOp::Mul, a, b);
        let product = a as u32 * b as u32;
        prop_assert_eq!(((cpu.regs.o as u32) << 16) | cpu.regs[Reg::A] as u32, product);
    }

    #[test]
    fn mod_matches_remainder(a: u16, b: u16) {
        let cpu = exec_ab(BasicOp::Mod, a, b);
        let expected = if b == 0 { 0 } else { a % b };
        prop_assert_eq!(cpu.regs[Reg::A], expected);
    }

    #[test]
    fn div_quotient_and_fraction(a: u16, b in 1u16..) {
        let cpu = exec_ab(BasicOp::Div, a, b);
        prop_assert_eq!(cpu.regs[Reg::A], a / b);
        prop_assert_eq!(cpu.regs.o as u32, (((a as u32) << 16) / b as u32) & 0xFFFF);
    }

    #[test]
    fn div_by_zero_is_zero(a: u16, o: u16) {
        let mut cpu = Cpu::new();
        cpu.regs[Reg::A] = a;
        cpu.regs.o = o;
        cpu.load_program(&[basic(BasicOp::Div, Operand::Register(Reg::A), Operand::Register(Reg::B))])
            .unwrap();
        cpu.step().unwrap();
        prop_assert_eq!(cpu.regs[Reg::A], 0);
        prop_assert_eq!(cpu.regs.o, 0);
    }

    #[test]
    fn set_copies_source(a: u16, b: u16) {
        let cpu = exec_ab(BasicOp::Set, a, b);
        prop_assert_eq!(cpu.regs[Reg::A], b);
        prop_assert_eq!(cpu.regs[Reg::B], b);
    }

    #[test]
    fn conditionals_skip_on_false(a: u16, b: u16) {
        for (op, holds) in [
            (BasicOp::Ife, a == b),
            (BasicOp::Ifn, a != b),
            (BasicOp::Ifg, a > b),
            (BasicOp::Ifb, (a & b) != 0),
        ] {
            let mut cpu = exec_ab(op, a, b);
            prop_assert_eq!(cpu.skip, !holds);

            if cpu.skip {
                let regs = cpu.regs.clone();
                // Next word is 0, a one-word instruction.
                prop_assert_eq!(cpu.step().unwrap(), Step::Skipped { words: 1 });
                prop_assert!(!cpu.skip);
                prop_assert_eq!(cpu.regs.gp, regs.gp);
                prop_assert_eq!(cpu.regs.sp, regs.sp);
                prop_assert_eq!(cpu.regs.o, regs.o);
                prop_assert!(cpu.is_running());
            }
        }
    }

    #[test]
    fn literal_targets_are_never_written(code in 1u8..=0xF, lit in 0u16..0x20, b: u16) {
        let op = BasicOp::from_code(code).unwrap();
        let mut cpu = Cpu::new();
        cpu.regs[Reg::B] = b;
        cpu.load_program(&[basic(op, Operand::Literal(lit), Operand::Register(Reg::B))])
            .unwrap();
        let before = cpu.mem.clone();
        let gp = cpu.regs.gp;

        cpu.step().unwrap();

        prop_assert_eq!(cpu.regs.gp, gp);
        prop_assert_eq!(cpu.regs.sp, 0xFFFF);
        prop_assert_eq!(cpu.regs.pc, 1);
        prop_assert!(cpu.mem == before);
    }

    #[test]
    fn jsr_pushes_return_address(start in 0u16..0x8000, target: u16) {
        let mut cpu = Cpu::new();
        cpu.regs.pc = start;
        cpu.mem.write(start, encode(&Instruction::Jsr { a: Operand::NextWord }));
        cpu.mem.write(start + 1, target);

        cpu.step().unwrap();

        prop_assert_eq!(cpu.regs.pc, target);
        prop_assert_eq!(cpu.regs.sp, 0xFFFE);
        prop_assert_eq!(cpu.mem.read(0xFFFE), start + 2);
    }
}
