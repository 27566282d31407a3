use apt_index::*;

const MAIN_AMD64: &str = "\
Package: lliurex-store
Version: 3.1.0
Architecture: amd64
Filename: pool/main/l/lliurex-store/lliurex-store_3.1.0_amd64.deb
Size: 90210

Package: lliurex-artwork-default
Version: 1.10
Architecture: all
Size: 5242880

Package: lliurex-artwork-default
Version: 1.9
Architecture: all
Size: 5000000
";

#[test]
fn test_compressed_index_roundtrip_through_every_format() {
    for compression in Compression::preferred_order() {
        let body = compression.compress(MAIN_AMD64.as_bytes()).unwrap();
        let text = compression.decode_text(&body).unwrap();
        let index = PackageIndex::from_str(&text).unwrap();

        assert_eq!(index.len(), 3, "{} index", compression);
        assert_eq!(index.packages()[0].package, "lliurex-store");
    }
}

#[test]
fn test_highest_version_selection() {
    let index = PackageIndex::from_str(MAIN_AMD64).unwrap();
    let newest = index
        .packages()
        .iter()
        .filter(|p| p.package == "lliurex-artwork-default")
        .max_by(|a, b| compare_versions(&a.version, &b.version))
        .unwrap();

    assert_eq!(newest.version, "1.10");
    assert_eq!(newest.size, 5242880);
}

#[test]
fn test_html_error_page_is_not_an_index() {
    let page = "<!DOCTYPE html>\n<html><body>404 Not Found</body></html>\n";
    let err = PackageIndex::from_str(page).unwrap_err();
    assert!(matches!(err, AptIndexError::InvalidPackageData(_)));
}

#[test]
fn test_release_with_unsorted_checksum_sections() {
    let release = Release::from_str(
        "Codename: noble\n\
         Date: Sun, 18 Oct 2026 10:00:00 UTC\n\
         MD5Sum:\n \
         d41d8cd98f00b204e9800998ecf8427e 0 main/binary-amd64/Packages\n\
         SHA256:\n \
         e3b0c44298fc1c149afbf4c8996fb924 0 main/binary-amd64/Packages\n",
    )
    .unwrap();

    assert_eq!(release.codename.as_deref(), Some("noble"));
    assert_eq!(release.packages_indexes().count(), 1);
    assert_eq!(release.files[0].sha256, "e3b0c44298fc1c149afbf4c8996fb924");
}
