//! Toolchain descriptor generation
//!
//! Renders the CMake toolchain file that carries platform and compiler
//! settings into the configure step. Rendering is a pure function of its
//! inputs so repeated generation yields identical files.

use std::fmt::Write as _;
use std::path::Path;

use crate::core::layout::BuildLayout;
use crate::core::recipe::CmakeConfig;
use crate::core::settings::Settings;

/// Header written at the top of every generated CMake file
pub const GENERATED_HEADER: &str = "# Generated by carbio. Do not edit; run `carbio generate` instead.";

/// Format a path for CMake, which always wants forward slashes
pub fn cmake_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}

/// Render `carbio_toolchain.cmake`
pub fn render_toolchain(settings: &Settings, layout: &BuildLayout, cmake: &CmakeConfig) -> String {
    let mut out = String::new();
    let generators = cmake_path(&layout.generators);

    let _ = writeln!(out, "{GENERATED_HEADER}");
    let _ = writeln!(out, "include_guard()");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "# os={} arch={} build_type={}",
        settings.os, settings.arch, settings.build_type
    );

    if settings.is_cross() {
        let _ = writeln!(out);
        let _ = writeln!(out, "set(CMAKE_SYSTEM_NAME {})", settings.cmake_system_name());
        let _ = writeln!(
            out,
            "set(CMAKE_SYSTEM_PROCESSOR {})",
            settings.cmake_system_processor()
        );
    }

    if let Some(compiler) = &settings.compiler {
        let _ = writeln!(out);
        if let Some((cc, cxx)) = compiler.executables() {
            let _ = writeln!(out, "set(CMAKE_C_COMPILER {cc})");
            let _ = writeln!(out, "set(CMAKE_CXX_COMPILER {cxx})");
        }
        if let Some((standard, extensions)) = compiler.cxx_standard() {
            let _ = writeln!(out, "set(CMAKE_CXX_STANDARD {standard})");
            let _ = writeln!(
                out,
                "set(CMAKE_CXX_EXTENSIONS {})",
                if extensions { "ON" } else { "OFF" }
            );
            let _ = writeln!(out, "set(CMAKE_CXX_STANDARD_REQUIRED ON)");
        }
        match compiler.libcxx.as_deref() {
            Some("libc++") => {
                let _ = writeln!(out, "string(APPEND CMAKE_CXX_FLAGS_INIT \" -stdlib=libc++\")");
            }
            Some("libstdc++") => {
                let _ = writeln!(out, "add_compile_definitions(_GLIBCXX_USE_CXX11_ABI=0)");
            }
            _ => {}
        }
    }

    if !cmake.is_multi_config() {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "set(CMAKE_BUILD_TYPE \"{}\" CACHE STRING \"Build type\" FORCE)",
            settings.build_type
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "set(CMAKE_FIND_PACKAGE_PREFER_CONFIG ON)");
    let _ = writeln!(out, "list(PREPEND CMAKE_PREFIX_PATH \"{generators}\")");
    let _ = writeln!(out, "list(PREPEND CMAKE_MODULE_PATH \"{generators}\")");

    out
}
