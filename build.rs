use std::fs;

fn main() {
    println!("cargo:rerun-if-changed=VERSION");

    let version = match fs::read_to_string("VERSION") {
        Ok(content) => content.trim().to_string(),
        Err(_) => {
            println!("cargo:warning=VERSION file not found, using default version");
            "0.1.0".to_string()
        }
    };

    println!("cargo:rustc-env=SUPAKEY_VERSION={}", version);

    #[cfg(windows)]
    {
        let mut res = winres::WindowsResource::new();

        if std::path::Path::new("icon.ico").exists() {
            res.set_icon("icon.ico");
        }

        res.set("FileVersion", &version)
            .set("ProductVersion", &version)
            .set("FileDescription", env!("CARGO_PKG_DESCRIPTION"))
            .set("ProductName", "supakey")
            .set("OriginalFilename", "supakey.exe")
            .set("InternalName", "supakey")
            .compile()
            .expect("Failed to compile Windows resources");
    }
}
