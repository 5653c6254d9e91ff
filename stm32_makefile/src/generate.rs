use crate::format::{format_list, format_single_line, prefix_if_missing};
use crate::model::{CustomMakefileRule, DEFAULT_OPTIMIZATION, MakeInfo};

/// Environment file the generated Makefile includes before resolving tools.
pub const ENVIRONMENT_FILE_NAME: &str = ".stm32env";

const BANNER: &str = "#######################################";

/// Renders each custom rule as its own target block, blank-line separated.
pub fn render_custom_rules(rules: &[CustomMakefileRule]) -> String {
    rules
        .iter()
        .map(|rule| {
            let depends_on = rule
                .depends_on
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(|d| format!(" {d}"))
                .unwrap_or_default();
            format!(
                "{BANNER}\n# {command}\n{BANNER}\n{command}:{depends_on}\n\t{body}\n\n",
                command = rule.command.trim(),
                body = rule.rule.trim(),
            )
        })
        .collect()
}

fn join_flags(flags: &[String]) -> String {
    flags
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn toolchain_path_line(info: &MakeInfo) -> String {
    match info.tools.arm_toolchain_path() {
        Some(path) => format!("ARM_GCC_PATH ?= {path}"),
        None => "# ARM_GCC_PATH is unset, the toolchain is resolved through PATH".to_string(),
    }
}

/// Renders a complete Makefile for `info`.
///
/// The output depends only on `info`: lists are sorted and deduplicated, so
/// equal inputs always give byte-identical text.
pub fn generate_makefile(info: &MakeInfo) -> String {
    let target = info.target.trim();
    let optimization = match info.optimization.trim() {
        "" => DEFAULT_OPTIMIZATION,
        opt => opt,
    };

    let c_sources = format_list(&info.c_sources, "");
    let cxx_sources = format_list(&info.cxx_sources, "");
    let asm_sources = format_list(&info.asm_sources, "");

    let env_file = ENVIRONMENT_FILE_NAME;
    let toolchain_path = toolchain_path_line(info);
    let openocd = info.tools.openocd_path().unwrap_or("openocd");

    let cpu = prefix_if_missing(&info.cpu, "-mcpu=");
    let fpu = prefix_if_missing(&info.fpu, "-mfpu=");
    let float_abi = prefix_if_missing(&info.float_abi, "-mfloat-abi=");
    let target_mcu = info.target_mcu.trim();

    let as_defs = format_list(&info.as_defs, "-D");
    let c_defs = format_list(&info.c_defs, "-D");
    let cxx_defs = format_list(&info.cxx_defs, "-D");
    let c_includes = format_list(&info.c_includes, "-I");

    let assembly_flags = join_flags(&info.assembly_flags);
    let c_flags = join_flags(&info.c_flags);
    let cxx_flags = join_flags(&info.cxx_flags);

    let ldscript = info.ldscript.trim();
    let libs = format_single_line(&info.libs, "-l");
    let libdir = format_single_line(&info.libdir, "-L");
    let ld_flags = join_flags(&info.ld_flags);

    let custom_rules = render_custom_rules(&info.custom_makefile_rules);

    format!(
        "##########################################################################################################################
# File automatically-generated by stm32_make
##########################################################################################################################

# ------------------------------------------------
# Generic Makefile (based on gcc)
# ------------------------------------------------

THIS_MAKEFILE := $(lastword $(MAKEFILE_LIST))

######################################
# target
######################################
TARGET = {target}

######################################
# building variables
######################################
# debug build?
DEBUG ?= 1
# optimization
OPTIMIZATION = {optimization}

#######################################
# paths
#######################################
# Build path
ifeq ($(DEBUG), 1)
BUILD_DIRECTORY = build/debug
DEBUG_FLAGS = -g -gdwarf -ggdb
else
BUILD_DIRECTORY = build/release
DEBUG_FLAGS =
endif

######################################
# source
######################################
# C sources
C_SOURCES =  \\
{c_sources}
# CXX sources
CXX_SOURCES =  \\
{cxx_sources}
# ASM sources
AS_SOURCES =  \\
{asm_sources}
#######################################
# environment
#######################################
-include ./{env_file}

#######################################
# binaries
#######################################
PREFIX = arm-none-eabi-
{toolchain_path}
ifdef ARM_GCC_PATH
CC = $(ARM_GCC_PATH)/$(PREFIX)gcc
CXX = $(ARM_GCC_PATH)/$(PREFIX)g++
AS = $(ARM_GCC_PATH)/$(PREFIX)gcc -x assembler-with-cpp
CP = $(ARM_GCC_PATH)/$(PREFIX)objcopy
SZ = $(ARM_GCC_PATH)/$(PREFIX)size
else
CC = $(PREFIX)gcc
CXX = $(PREFIX)g++
AS = $(PREFIX)gcc -x assembler-with-cpp
CP = $(PREFIX)objcopy
SZ = $(PREFIX)size
endif
HEX = $(CP) -O ihex
BIN = $(CP) -O binary -S

# flashing
OPENOCD ?= {openocd}

#######################################
# CFLAGS
#######################################
# cpu
CPU = {cpu}

# fpu
FPU = {fpu}

# float-abi
FLOAT-ABI = {float_abi}

# mcu
MCU = $(CPU) -mthumb $(FPU) $(FLOAT-ABI)

# openocd target
TARGET_MCU = {target_mcu}

# macros for gcc
# AS defines
AS_DEFINITIONS =  \\
{as_defs}
# C defines
C_DEFINITIONS =  \\
{c_defs}
# CXX defines
CXX_DEFINITIONS =  \\
{cxx_defs}
# C includes
C_INCLUDES =  \\
{c_includes}
# compile gcc flags
ASFLAGS = $(MCU) $(AS_DEFINITIONS) $(C_INCLUDES) $(OPTIMIZATION) $(DEBUG_FLAGS) -Wall -fdata-sections -ffunction-sections
CFLAGS = $(MCU) $(C_DEFINITIONS) $(C_INCLUDES) $(OPTIMIZATION) $(DEBUG_FLAGS) -Wall -fdata-sections -ffunction-sections
CXXFLAGS = $(MCU) $(CXX_DEFINITIONS) $(C_INCLUDES) $(OPTIMIZATION) $(DEBUG_FLAGS) -Wall -fdata-sections -ffunction-sections -fno-exceptions -fno-rtti

# additional flags
ASFLAGS += {assembly_flags}
CFLAGS += {c_flags}
CXXFLAGS += {cxx_flags}

# generate dependency information
ASFLAGS += -MMD -MP -MF\"$(@:%.o=%.d)\"
CFLAGS += -MMD -MP -MF\"$(@:%.o=%.d)\"
CXXFLAGS += -MMD -MP -MF\"$(@:%.o=%.d)\"

#######################################
# LDFLAGS
#######################################
# link script
LINKER_SCRIPT = {ldscript}

# libraries
LIBRARIES = {libs}
LIBRARY_DIRECTORIES = {libdir}

# additional linker flags
ADDITIONAL_LDFLAGS = {ld_flags}

LDFLAGS = $(MCU) -specs=nano.specs -T$(LINKER_SCRIPT) $(LIBRARY_DIRECTORIES) $(LIBRARIES) -Wl,-Map=$(BUILD_DIRECTORY)/$(TARGET).map,--cref -Wl,--gc-sections $(ADDITIONAL_LDFLAGS)

# link with g++ as soon as there is C++ code
ifeq ($(strip $(CXX_SOURCES)),)
LINKER = $(CC)
else
LINKER = $(CXX)
endif

# default action: build all
all: $(BUILD_DIRECTORY)/$(TARGET).elf $(BUILD_DIRECTORY)/$(TARGET).hex $(BUILD_DIRECTORY)/$(TARGET).bin

#######################################
# build the application
#######################################
# objects keep their source directory below the build directory
OBJECTS = $(addprefix $(BUILD_DIRECTORY)/,$(addsuffix .o,$(basename $(C_SOURCES))))
OBJECTS += $(addprefix $(BUILD_DIRECTORY)/,$(addsuffix .o,$(basename $(CXX_SOURCES))))
OBJECTS += $(addprefix $(BUILD_DIRECTORY)/,$(addsuffix .o,$(basename $(AS_SOURCES))))

$(BUILD_DIRECTORY)/%.o: %.c $(THIS_MAKEFILE)
\t@mkdir -p $(dir $@)
\t$(CC) -c $(CFLAGS) -Wa,-a,-ad,-alms=$(@:.o=.lst) $< -o $@

$(BUILD_DIRECTORY)/%.o: %.cpp $(THIS_MAKEFILE)
\t@mkdir -p $(dir $@)
\t$(CXX) -c $(CXXFLAGS) -Wa,-a,-ad,-alms=$(@:.o=.lst) $< -o $@

$(BUILD_DIRECTORY)/%.o: %.cc $(THIS_MAKEFILE)
\t@mkdir -p $(dir $@)
\t$(CXX) -c $(CXXFLAGS) -Wa,-a,-ad,-alms=$(@:.o=.lst) $< -o $@

$(BUILD_DIRECTORY)/%.o: %.cxx $(THIS_MAKEFILE)
\t@mkdir -p $(dir $@)
\t$(CXX) -c $(CXXFLAGS) -Wa,-a,-ad,-alms=$(@:.o=.lst) $< -o $@

$(BUILD_DIRECTORY)/%.o: %.c++ $(THIS_MAKEFILE)
\t@mkdir -p $(dir $@)
\t$(CXX) -c $(CXXFLAGS) -Wa,-a,-ad,-alms=$(@:.o=.lst) $< -o $@

$(BUILD_DIRECTORY)/%.o: %.s $(THIS_MAKEFILE)
\t@mkdir -p $(dir $@)
\t$(AS) -c $(ASFLAGS) $< -o $@

$(BUILD_DIRECTORY)/%.o: %.S $(THIS_MAKEFILE)
\t@mkdir -p $(dir $@)
\t$(AS) -c $(ASFLAGS) $< -o $@

$(BUILD_DIRECTORY)/%.o: %.asm $(THIS_MAKEFILE)
\t@mkdir -p $(dir $@)
\t$(AS) -c $(ASFLAGS) $< -o $@

$(BUILD_DIRECTORY)/$(TARGET).elf: $(OBJECTS) $(THIS_MAKEFILE)
\t$(LINKER) $(OBJECTS) $(LDFLAGS) -o $@
\t$(SZ) $@

$(BUILD_DIRECTORY)/%.hex: $(BUILD_DIRECTORY)/%.elf
\t$(HEX) $< $@

$(BUILD_DIRECTORY)/%.bin: $(BUILD_DIRECTORY)/%.elf
\t$(BIN) $< $@

#######################################
# flash
#######################################
flash: $(BUILD_DIRECTORY)/$(TARGET).elf
\t\"$(OPENOCD)\" -f ./openocd.cfg -c \"program $(BUILD_DIRECTORY)/$(TARGET).elf verify reset exit\"

#######################################
# erase
#######################################
erase: $(BUILD_DIRECTORY)/$(TARGET).elf
\t\"$(OPENOCD)\" -f ./openocd.cfg -c \"init; reset halt; $(TARGET_MCU) mass_erase 0; exit\"

#######################################
# clean up
#######################################
ifeq ($(OS),Windows_NT)
REMOVE_DIRECTORY_COMMAND = cmd /c rd /s /q
else
REMOVE_DIRECTORY_COMMAND = rm -fR
endif

clean:
\t-$(REMOVE_DIRECTORY_COMMAND) build

{custom_rules}#######################################
# dependencies
#######################################
-include $(OBJECTS:.o=.d)

.PHONY: all flash erase clean

# *** EOF ***
"
    )
}
