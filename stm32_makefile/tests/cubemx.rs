use pretty_assertions::assert_eq;
use stm32_makefile::{
    MakeInfo, extract_libraries, extract_makefile_info, extract_multi_line, extract_single_line,
    generate_makefile,
};

const CUBEMX_H743: &str = include_str!("fixtures/cubemx_h743.mk");
const HAND_EDITED_G4: &str = include_str!("fixtures/hand_edited_g4.mk");

#[test]
fn test_single_line_cpu_keeps_flag() {
    assert_eq!(
        extract_single_line("CPU", CUBEMX_H743).as_deref(),
        Some("-mcpu=cortex-m7")
    );
}

#[test]
fn test_multi_line_defs() {
    assert_eq!(
        extract_multi_line("C_DEFS", CUBEMX_H743),
        vec!["-DUSE_HAL_DRIVER", "-DSTM32H743xx"]
    );
    assert!(extract_multi_line("CPP_SOURCES", CUBEMX_H743).is_empty());
}

#[test]
fn test_libraries() {
    assert_eq!(extract_libraries(CUBEMX_H743), vec!["-lc", "-lm", "-lnosys"]);
}

#[test]
fn test_extract_cubemx_makefile() {
    let info = extract_makefile_info(CUBEMX_H743);

    assert_eq!(info.target, "h743_blinky");
    assert_eq!(info.cpu, "cortex-m7");
    assert_eq!(info.fpu, "fpv5-d16");
    assert_eq!(info.float_abi, "hard");
    assert_eq!(info.mcu, "$(CPU) -mthumb $(FPU) $(FLOAT-ABI)");
    assert_eq!(info.ldscript, "STM32H743ZITx_FLASH.ld");
    assert_eq!(info.optimization, "-Og");
    assert_eq!(info.prefix, "arm-none-eabi-");
    assert_eq!(info.target_mcu, "stm32h7x");

    assert_eq!(info.c_sources.len(), 9);
    assert_eq!(info.c_sources[0], "Core/Src/main.c");
    assert_eq!(info.c_sources[8], "Core/Src/system_stm32h7xx.c");
    assert_eq!(info.asm_sources, vec!["startup_stm32h743xx.s"]);
    assert!(info.cxx_sources.is_empty());

    assert_eq!(info.c_defs, vec!["USE_HAL_DRIVER", "STM32H743xx"]);
    assert!(info.as_defs.is_empty());
    assert!(info.cxx_defs.is_empty());
    assert_eq!(
        info.c_includes,
        vec![
            "Core/Inc",
            "Drivers/STM32H7xx_HAL_Driver/Inc",
            "Drivers/STM32H7xx_HAL_Driver/Inc/Legacy",
            "Drivers/CMSIS/Device/ST/STM32H7xx/Include",
            "Drivers/CMSIS/Include",
        ]
    );
    assert_eq!(info.libs, vec!["c", "m", "nosys"]);
    assert!(info.libdir.is_empty());
    assert!(!info.is_empty());
}

#[test]
fn test_migrate_cubemx_makefile() {
    let extracted = extract_makefile_info(CUBEMX_H743);
    let info = MakeInfo::from(extracted.clone());
    let regenerated = extract_makefile_info(&generate_makefile(&info));

    assert_eq!(regenerated.target, extracted.target);
    assert_eq!(regenerated.cpu, extracted.cpu);
    assert_eq!(regenerated.fpu, extracted.fpu);
    assert_eq!(regenerated.float_abi, extracted.float_abi);
    assert_eq!(regenerated.ldscript, extracted.ldscript);
    assert_eq!(regenerated.target_mcu, extracted.target_mcu);
    assert_eq!(regenerated.optimization, extracted.optimization);
    assert_eq!(regenerated.prefix, extracted.prefix);
    assert_eq!(MakeInfo::from(regenerated), info);
}

#[test]
fn test_extract_hand_edited_makefile() {
    let info = extract_makefile_info(HAND_EDITED_G4);

    assert_eq!(info.target, "g4_motor");
    assert_eq!(info.target_mcu, "stm32g4x");
    // 以 '\\' 结尾的注释会吞掉下一行，和 make 一致
    assert_eq!(
        info.c_sources,
        vec![
            "Core/Src/main.c",
            "Core/Src/stm32g4xx_it.c",
            "App/foc.c",
            "App/svpwm.c",
        ]
    );
    assert_eq!(info.asm_sources, vec!["startup_stm32g431xx.s", "App/fast_math.s"]);
    assert_eq!(info.c_defs, vec!["USE_HAL_DRIVER", "STM32G431xx", "ARM_MATH_CM4"]);
    assert_eq!(
        info.c_includes,
        vec![
            "Core/Inc",
            "Drivers/STM32G4xx_HAL_Driver/Inc",
            "Drivers/CMSIS/Include",
            "App",
        ]
    );
    assert!(info.as_defs.is_empty());
    assert_eq!(info.libs, vec!["c", "m", "nosys", "arm_cortexM4lf_math"]);
    assert_eq!(info.libdir, vec!["Middlewares/ST/ARM/DSP/Lib"]);
}

#[test]
fn test_migrate_hand_edited_makefile_keeps_appended_entries() {
    let extracted = extract_makefile_info(HAND_EDITED_G4);
    let info = MakeInfo::from(extracted);
    let regenerated = MakeInfo::from(extract_makefile_info(&generate_makefile(&info)));

    assert!(regenerated.c_sources.contains("App/svpwm.c"));
    assert!(regenerated.asm_sources.contains("App/fast_math.s"));
    assert!(regenerated.libs.contains("arm_cortexM4lf_math"));
    assert_eq!(regenerated, info);
}
