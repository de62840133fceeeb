use std::env;
use std::fs;
use std::path::{Path, PathBuf};

// pdfium-render binds the library at runtime, so nothing here links against
// it. The script only fetches a copy into vendor/pdfium for `init_pdfium`.
fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    if env::var("CARGO_FEATURE_PDF_VIEWER").is_err() {
        return;
    }
    let Ok(target) = env::var("TARGET") else {
        return;
    };

    let Some((platform, arch, lib_name)) = platform_for(&target) else {
        println!("cargo:warning=No prebuilt PDFium for {target}, rendering will use the system library");
        return;
    };

    let Some(pdfium_dir) = vendor_dir() else {
        return;
    };
    let lib_dir = pdfium_dir.join("lib");
    let lib_path = lib_dir.join(lib_name);
    println!("cargo:rerun-if-changed={}", lib_dir.display());

    if lib_path.exists() {
        fix_library_install_name(&lib_path, platform);
        return;
    }

    if env::var("PDF_MERGE_SKIP_PDFIUM_DOWNLOAD").is_ok() {
        return;
    }

    match install(&pdfium_dir, platform, arch) {
        Ok(()) if lib_path.exists() => {
            println!(
                "cargo:warning=PDFium installed to {}",
                pdfium_dir.display()
            );
            fix_library_install_name(&lib_path, platform);
        }
        Ok(()) => println!(
            "cargo:warning=PDFium archive did not contain {}",
            lib_path.display()
        ),
        Err(e) => println!(
            "cargo:warning=PDFium download failed ({e}); thumbnails need a system PDFium"
        ),
    }
}

fn platform_for(target: &str) -> Option<(&'static str, &'static str, &'static str)> {
    let arm = target.contains("aarch64");
    if target.contains("apple") {
        Some(("mac", if arm { "arm64" } else { "x64" }, "libpdfium.dylib"))
    } else if target.contains("linux") {
        Some(("linux", if arm { "arm64" } else { "x64" }, "libpdfium.so"))
    } else if target.contains("windows") {
        let arch = if arm {
            "arm64"
        } else if target.contains("i686") {
            "x86"
        } else {
            "x64"
        };
        Some(("win", arch, "pdfium.dll"))
    } else {
        None
    }
}

fn vendor_dir() -> Option<PathBuf> {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").ok()?);
    let workspace_root = manifest_dir.parent()?.parent()?;
    Some(workspace_root.join("vendor").join("pdfium"))
}

fn install(pdfium_dir: &Path, platform: &str, arch: &str) -> Result<(), Box<dyn std::error::Error>> {
    // Matches the pdfium_7543 feature of pdfium-render
    let pdfium_version = "chromium/7543";
    let url = format!(
        "https://github.com/bblanchon/pdfium-binaries/releases/download/{pdfium_version}/pdfium-{platform}-{arch}.tgz"
    );

    fs::create_dir_all(pdfium_dir)?;
    let tarball = env::temp_dir().join("pdfium.tgz");
    download_file(&url, &tarball)?;
    let extracted = extract_tarball(&tarball, pdfium_dir);
    let _ = fs::remove_file(&tarball);
    extracted
}

fn download_file(url: &str, dest: &Path) -> Result<(), Box<dyn std::error::Error>> {
    use std::io::Write;

    let response = ureq::get(url).call()?;
    let mut file = fs::File::create(dest)?;
    std::io::copy(&mut response.into_reader(), &mut file)?;
    file.flush()?;
    Ok(())
}

fn extract_tarball(tarball: &Path, dest: &Path) -> Result<(), Box<dyn std::error::Error>> {
    use flate2::read::GzDecoder;
    use tar::Archive;

    let tar = GzDecoder::new(fs::File::open(tarball)?);
    Archive::new(tar).unpack(dest)?;
    Ok(())
}

fn fix_library_install_name(lib_path: &Path, platform: &str) {
    if platform != "mac" {
        return;
    }

    let output = std::process::Command::new("install_name_tool")
        .arg("-id")
        .arg("@rpath/libpdfium.dylib")
        .arg(lib_path)
        .output();

    match output {
        Ok(result) if result.status.success() => {}
        Ok(result) => println!(
            "cargo:warning=Failed to fix install name: {}",
            String::from_utf8_lossy(&result.stderr)
        ),
        Err(e) => println!("cargo:warning=install_name_tool not available: {e}"),
    }
}
