// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Jump to the installed bootloader's reset handler.
//!
//! Unlike the application firmware's A/B bank loader this replaces, the
//! bootloader runs in place from its own flash slot. There is no RAM copy,
//! just a vector-table read, a relocation of `VTOR`, and a branch.

/// Read the two leading words of a Cortex-M vector table: initial stack
/// pointer and reset handler address.
unsafe fn read_vector_table(base: u32) -> (u32, u32) {
    let initial_sp = (base as *const u32).read_volatile();
    let reset_vector = (base as *const u32).offset(1).read_volatile();
    (initial_sp, reset_vector)
}

/// Jump to the bootloader at `bl_base`, never returning.
///
/// # Safety
/// `bl_base` must point at a valid Cortex-M vector table occupying flash
/// that will remain mapped (XIP) once this function relocates `VTOR` and
/// branches into it.
pub unsafe fn jump_to_bootloader(bl_base: u32) -> ! {
    let (initial_sp, reset_vector) = read_vector_table(bl_base);

    cortex_m::interrupt::disable();
    const SCB_VTOR: *mut u32 = 0xE000_ED08 as *mut u32;
    SCB_VTOR.write_volatile(bl_base);
    cortex_m::asm::dsb();
    cortex_m::asm::isb();

    core::arch::asm!(
        "msr msp, {sp}",
        "cpsie i",
        "bx {reset}",
        sp = in(reg) initial_sp,
        reset = in(reg) reset_vector,
        options(noreturn)
    );
}
