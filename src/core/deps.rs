//! Dependency descriptor generation
//!
//! For every declared dependency this renders a CMake package config file
//! (and a version file when the dependency resolved) that defines the
//! imported target `<name>::<name>`. An aggregate file lists link-time and
//! test-only targets separately so test dependencies never reach the
//! artifact's link line.

use std::fmt::Write as _;

use crate::config::defaults;
use crate::core::dependency::{DependencyDeclaration, Requirements};
use crate::core::options::{cmake_value, OptionSet, PackageOptions};
use crate::core::resolver::ResolvedDependency;
use crate::core::toolchain::{cmake_path, GENERATED_HEADER};

/// A rendered file, named relative to the generators folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub name: String,
    pub content: String,
}

/// Outcome of resolving one declaration
#[derive(Debug, Clone)]
pub struct Resolution {
    pub declaration: DependencyDeclaration,
    pub resolved: Option<ResolvedDependency>,
}

/// Render every dependency descriptor plus the aggregate file, in declaration order
pub fn render_descriptors(
    requirements: &Requirements,
    resolutions: &[Resolution],
    options: &OptionSet,
) -> Vec<GeneratedFile> {
    let mut files = Vec::new();

    for resolution in resolutions {
        let name = &resolution.declaration.name;
        let package_options = options.for_package(name);
        match &resolution.resolved {
            Some(resolved) => {
                files.push(GeneratedFile {
                    name: format!("{name}-config.cmake"),
                    content: render_config(resolved, &package_options),
                });
                files.push(GeneratedFile {
                    name: version_file_name(name),
                    content: render_config_version(resolved),
                });
            }
            None => files.push(GeneratedFile {
                name: format!("{name}-config.cmake"),
                content: render_unresolved_config(&resolution.declaration),
            }),
        }
    }

    files.push(GeneratedFile {
        name: defaults::DEPS_FILE.to_string(),
        content: render_aggregate(requirements),
    });

    files
}

fn version_file_name(name: &str) -> String {
    format!("{name}-config-version.cmake")
}

/// Files an earlier generation may have left that the current one does not
/// produce: version files of dependencies that no longer resolve
pub fn stale_files(resolutions: &[Resolution]) -> Vec<String> {
    resolutions
        .iter()
        .filter(|r| r.resolved.is_none())
        .map(|r| version_file_name(&r.declaration.name))
        .collect()
}

fn join_paths(paths: &[std::path::PathBuf]) -> String {
    paths
        .iter()
        .map(|p| cmake_path(p))
        .collect::<Vec<_>>()
        .join(";")
}

/// Package config defining the imported target
pub fn render_config(resolved: &ResolvedDependency, options: &PackageOptions) -> String {
    let name = &resolved.name;
    let target = format!("{name}::{name}");
    let mut out = String::new();

    let _ = writeln!(out, "{GENERATED_HEADER}");
    let _ = writeln!(
        out,
        "# {name}/{} ({}) from {}",
        resolved.version,
        resolved.role,
        cmake_path(&resolved.root)
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "if(TARGET {target})");
    let _ = writeln!(out, "  return()");
    let _ = writeln!(out, "endif()");
    let _ = writeln!(out);
    let _ = writeln!(out, "set({name}_FOUND TRUE)");
    let _ = writeln!(out, "set({name}_VERSION \"{}\")", resolved.version);
    let _ = writeln!(
        out,
        "set({name}_HEADER_ONLY {})",
        if resolved.header_only { "ON" } else { "OFF" }
    );
    for (option, value) in options {
        let _ = writeln!(
            out,
            "set({name}_OPTION_{} \"{}\")",
            option.to_ascii_uppercase(),
            cmake_value(value)
        );
    }
    let _ = writeln!(
        out,
        "set({name}_INCLUDE_DIRS \"{}\")",
        join_paths(&resolved.include_dirs)
    );
    let _ = writeln!(out, "set({name}_LIBRARIES \"\")");

    for lib in &resolved.libs {
        let var = format!("{name}_LIB_{}", lib.replace(['-', '.'], "_"));
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "find_library({var} NAMES {lib} PATHS \"{}\" NO_DEFAULT_PATH)",
            join_paths(&resolved.lib_dirs)
        );
        let _ = writeln!(out, "if(NOT {var})");
        let _ = writeln!(
            out,
            "  message(FATAL_ERROR \"Library '{lib}' of {name} not found in the package store\")"
        );
        let _ = writeln!(out, "endif()");
        let _ = writeln!(out, "list(APPEND {name}_LIBRARIES \"${{{var}}}\")");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "add_library({target} INTERFACE IMPORTED)");
    let _ = writeln!(out, "set_target_properties({target} PROPERTIES");
    let _ = writeln!(
        out,
        "  INTERFACE_INCLUDE_DIRECTORIES \"${{{name}_INCLUDE_DIRS}}\""
    );
    if !resolved.defines.is_empty() {
        let _ = writeln!(
            out,
            "  INTERFACE_COMPILE_DEFINITIONS \"{}\"",
            resolved.defines.join(";")
        );
    }
    let _ = writeln!(out, "  INTERFACE_LINK_LIBRARIES \"${{{name}_LIBRARIES}}\")");

    out
}

/// Version file: compatible with any request of the same major that is not newer
pub fn render_config_version(resolved: &ResolvedDependency) -> String {
    let version = &resolved.version;
    let mut out = String::new();

    let _ = writeln!(out, "{GENERATED_HEADER}");
    let _ = writeln!(out, "set(PACKAGE_VERSION \"{version}\")");
    let _ = writeln!(out);
    let _ = writeln!(out, "if(PACKAGE_FIND_VERSION VERSION_GREATER PACKAGE_VERSION)");
    let _ = writeln!(out, "  set(PACKAGE_VERSION_COMPATIBLE FALSE)");
    let _ = writeln!(out, "else()");
    let _ = writeln!(
        out,
        "  if(PACKAGE_FIND_VERSION_MAJOR STREQUAL \"{}\")",
        version.major
    );
    let _ = writeln!(out, "    set(PACKAGE_VERSION_COMPATIBLE TRUE)");
    let _ = writeln!(out, "  else()");
    let _ = writeln!(out, "    set(PACKAGE_VERSION_COMPATIBLE FALSE)");
    let _ = writeln!(out, "  endif()");
    let _ = writeln!(out, "  if(PACKAGE_FIND_VERSION STREQUAL PACKAGE_VERSION)");
    let _ = writeln!(out, "    set(PACKAGE_VERSION_EXACT TRUE)");
    let _ = writeln!(out, "  endif()");
    let _ = writeln!(out, "endif()");

    out
}

/// Config for a dependency with no installed artifact; `find_package` reports it missing
pub fn render_unresolved_config(declaration: &DependencyDeclaration) -> String {
    let name = &declaration.name;
    let mut out = String::new();

    let _ = writeln!(out, "{GENERATED_HEADER}");
    let _ = writeln!(out, "# {} ({}) is not installed", declaration.reference(), declaration.role);
    let _ = writeln!(out);
    let _ = writeln!(out, "set({name}_FOUND FALSE)");
    let _ = writeln!(
        out,
        "set({name}_NOT_FOUND_MESSAGE \"{} has no artifact in the package store\")",
        declaration.reference()
    );

    out
}

/// `carbio_deps.cmake`: finds every dependency and exposes the two target lists
pub fn render_aggregate(requirements: &Requirements) -> String {
    let targets = |decls: Vec<&DependencyDeclaration>| {
        decls
            .iter()
            .map(|d| d.target())
            .collect::<Vec<_>>()
            .join(" ")
    };

    let link: Vec<_> = requirements.link_set().collect();
    let test: Vec<_> = requirements.test_set().collect();

    let mut out = String::new();
    let _ = writeln!(out, "{GENERATED_HEADER}");
    let _ = writeln!(out, "include_guard()");
    let _ = writeln!(out);

    for decl in &link {
        let _ = writeln!(out, "find_package({} {} REQUIRED CONFIG)", decl.name, decl.version);
    }
    let _ = writeln!(out, "set(CARBIO_LINK_LIBRARIES {})", targets(link));

    let _ = writeln!(out);
    let _ = writeln!(out, "if(NOT CARBIO_SKIP_TEST_DEPENDENCIES)");
    for decl in &test {
        let _ = writeln!(out, "  find_package({} {} REQUIRED CONFIG)", decl.name, decl.version);
    }
    let _ = writeln!(out, "endif()");
    let _ = writeln!(out, "set(CARBIO_TEST_LIBRARIES {})", targets(test));

    out
}
