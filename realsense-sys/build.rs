fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    #[cfg(feature = "native")]
    link_native();
}

#[cfg(feature = "native")]
fn link_native() {
    // Prefer pkg-config so distribution packages resolve their own paths.
    if pkg_config::Config::new()
        .atleast_version("2.0")
        .probe("realsense2")
        .is_ok()
    {
        return;
    }

    // The upstream install scripts place the library under /usr/local/lib.
    println!("cargo:rustc-link-search=native=/usr/local/lib");
    println!("cargo:rustc-link-lib=realsense2");
}
