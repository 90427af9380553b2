use super::*;

#[test]
fn test_code_points() {
    assert_eq!(code_points("A"), vec![0x41]);
    assert_eq!(code_points("é"), vec![0xE9]);
    // outside the BMP: one scalar value, not two UTF-16 units
    assert_eq!(code_points("𝄞"), vec![0x1D11E]);
    assert_eq!(code_points("a€😀"), vec![0x61, 0x20AC, 0x1F600]);
    assert!(code_points("").is_empty());
}

#[test]
fn test_code_point_specifier_roundtrip() {
    for hex in ["0041", "41", "00e9", "20AC", "1F600", "10FFFF"] {
        let spec = CharacterSpecifier::parse(&format!("U+{}", hex));
        let expected = u32::from_str_radix(hex, 16).unwrap();
        match spec.decode("utf-8").unwrap() {
            Decoded::Text(text) => assert_eq!(code_points(&text), vec![expected]),
            other => panic!("U+{} decoded to {:?}", hex, other),
        }
    }
}

#[test]
fn test_specifier_classification() {
    assert_eq!(
        CharacterSpecifier::parse("U+2026"),
        CharacterSpecifier::CodePoint("2026".to_string())
    );
    assert_eq!(
        CharacterSpecifier::parse("…"),
        CharacterSpecifier::Literal("…".to_string())
    );
    // the prefix is case sensitive
    assert_eq!(
        CharacterSpecifier::parse("u+2026"),
        CharacterSpecifier::Literal("u+2026".to_string())
    );
    assert_eq!(
        CharacterSpecifier::from_bytes(vec![0xE9]),
        CharacterSpecifier::RawBytes(vec![0xE9])
    );
    assert_eq!(
        CharacterSpecifier::from_bytes("é".as_bytes().to_vec()),
        CharacterSpecifier::Literal("é".to_string())
    );
}

#[test]
fn test_malformed_code_points() {
    for token in ["U+", "U+XYZ", "U++41", "U+-41", "U+ 41", "U+123456789"] {
        let err = CharacterSpecifier::parse(token).decode("utf-8").unwrap_err();
        assert!(
            matches!(err, Error::MalformedCodePoint(ref literal) if literal == token),
            "{} gave {:?}",
            token,
            err
        );
    }
}

#[test]
fn test_unrepresentable_code_points() {
    assert_eq!(
        CharacterSpecifier::parse("U+110000").decode("utf-8").unwrap(),
        Decoded::Unrepresentable(0x110000)
    );
    // lone surrogates are not scalar values either
    assert_eq!(
        CharacterSpecifier::parse("U+D800").decode("utf-8").unwrap(),
        Decoded::Unrepresentable(0xD800)
    );
}

#[test]
fn test_raw_bytes_decoding() {
    let latin1 = CharacterSpecifier::RawBytes(vec![0xE9]);
    assert_eq!(latin1.decode("latin1").unwrap(), Decoded::Text("é".to_string()));
    assert_eq!(latin1.decode("iso-8859-15").unwrap(), Decoded::Text("é".to_string()));

    let sjis = CharacterSpecifier::RawBytes(vec![0x82, 0xA0]);
    assert_eq!(sjis.decode("shift_jis").unwrap(), Decoded::Text("あ".to_string()));

    assert!(matches!(
        latin1.decode("utf-8").unwrap_err(),
        Error::InvalidBytes { .. }
    ));
    assert!(matches!(
        latin1.decode("no-such-encoding").unwrap_err(),
        Error::UnknownEncoding(ref e) if e == "no-such-encoding"
    ));
}

#[test]
fn test_empty_specifier_is_fatal() {
    assert!(matches!(
        CharacterSpecifier::parse("").decode("utf-8").unwrap_err(),
        Error::EmptyCharacter
    ));
}

#[test]
fn test_specifier_keys() {
    assert_eq!(CharacterSpecifier::parse("U+00e9").key(), "U+00e9");
    assert_eq!(CharacterSpecifier::parse("x").key(), "x");
    assert_eq!(CharacterSpecifier::RawBytes(vec![b'a', 0xFF]).key(), "a\u{FFFD}");
}

#[test]
fn test_support_map_keeps_first_position() {
    let mut map = SupportMap::new();
    map.record("A".to_string(), true);
    map.record("é".to_string(), false);
    map.record("A".to_string(), false);

    assert_eq!(map.len(), 2);
    assert_eq!(map.iter().collect::<Vec<_>>(), vec![("A", 0), ("é", 0)]);
}

#[test]
fn test_vim_and_json_rendering() {
    let mut map = SupportMap::new();
    map.record("A".to_string(), true);
    map.record("'".to_string(), false);
    let res = SupportResult::Supported(map);

    assert_eq!(res.to_vim(), "{'A': 1, '''': 0}");
    assert_eq!(res.to_json().unwrap(), r#"{"A":1,"'":0}"#);

    let err = SupportResult::NoFontMatch {
        pattern: "Foo".to_string(),
    };
    assert_eq!(err.to_vim(), "{'_error': 'No font found for Foo'}");
    assert_eq!(err.to_json().unwrap(), r#"{"_error":"No font found for Foo"}"#);

    assert_eq!(SupportResult::Supported(SupportMap::new()).to_vim(), "{}");
}

#[test]
fn test_vim_rendering_escapes_control_characters() {
    let mut map = SupportMap::new();
    map.record("\n".to_string(), false);
    map.record("a\t\"\\\u{7}\u{85}".to_string(), false);
    let res = SupportResult::Supported(map);

    // double-quoted: a raw newline would split the line handed to eval()
    assert_eq!(res.to_vim(), r#"{"\n": 0, "a\t\"\\\u0007\u0085": 0}"#);
    assert!(!res.to_vim().contains('\n'));
}

#[test]
fn test_parse_fonts_conf() {
    let conf = r#"<?xml version="1.0"?>
<!DOCTYPE fontconfig SYSTEM "urn:fontconfig:fonts.dtd">
<fontconfig>
    <!-- Font directory list -->
    <dir>/usr/share/fonts</dir>
    <dir>/usr/local/share/fonts</dir>
    <dir prefix="xdg">fonts</dir>
    <!-- the following element will be removed in the future -->
    <dir>~/.fonts</dir>
    <dir prefix="relative">extra</dir>
    <dir/>
    <cachedir>/var/cache/fontconfig</cachedir>
    <include ignore_missing="yes">conf.d</include>
    <include prefix="xdg">fontconfig/fonts.conf</include>
</fontconfig>
"#;

    let dir = |prefix, path| FcConfEntry::Dir(FcFontDir { prefix, path });
    let entries = ParseFontsConf(conf).unwrap();
    assert_eq!(
        entries,
        vec![
            dir(DirPrefix::None, "/usr/share/fonts"),
            dir(DirPrefix::None, "/usr/local/share/fonts"),
            dir(DirPrefix::Xdg, "fonts"),
            dir(DirPrefix::None, "~/.fonts"),
            dir(DirPrefix::Relative, "extra"),
            FcConfEntry::Include {
                location: FcFontDir { prefix: DirPrefix::None, path: "conf.d" },
                ignore_missing: true,
            },
            FcConfEntry::Include {
                location: FcFontDir { prefix: DirPrefix::Xdg, path: "fontconfig/fonts.conf" },
                ignore_missing: false,
            },
        ]
    );
}

#[test]
fn test_parse_fonts_conf_rejects_nested_dirs() {
    let conf = "<fontconfig><dir><dir>/a</dir></dir></fontconfig>";
    assert!(ParseFontsConf(conf).is_none());

    let broken = "<fontconfig><dir>/a</fontconfig";
    assert!(ParseFontsConf(broken).is_none());

    let dir_in_include = "<fontconfig><include><dir>/a</dir></include></fontconfig>";
    assert!(ParseFontsConf(dir_in_include).is_none());
}

#[test]
fn test_resolve_font_dir() {
    let conf_dir = Path::new("/etc/fonts");

    let absolute = FcFontDir { prefix: DirPrefix::Xdg, path: "/opt/fonts" };
    assert_eq!(absolute.resolve(conf_dir), Some(PathBuf::from("/opt/fonts")));

    let relative = FcFontDir { prefix: DirPrefix::Relative, path: "extra" };
    assert_eq!(relative.resolve(conf_dir), Some(PathBuf::from("/etc/fonts/extra")));

    if let Some(home) = dirs::home_dir() {
        let tilde = FcFontDir { prefix: DirPrefix::None, path: "~/.fonts" };
        assert_eq!(tilde.resolve(conf_dir), Some(home.join(".fonts")));
    }
}

#[test]
fn test_includes_add_font_dirs_in_document_order() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let conf_d = root.join("conf.d");
    std::fs::create_dir_all(&conf_d).unwrap();

    std::fs::write(
        root.join("fonts.conf"),
        r#"<fontconfig>
    <dir>first</dir>
    <include ignore_missing="yes">conf.d</include>
    <include ignore_missing="yes">missing.d</include>
    <include>also-missing.conf</include>
    <dir>last</dir>
</fontconfig>"#,
    )
    .unwrap();
    std::fs::write(
        conf_d.join("09-texlive.conf"),
        "<fontconfig><dir>/opt/texlive/fonts/opentype</dir></fontconfig>",
    )
    .unwrap();
    // includes the top-level file again
    std::fs::write(
        conf_d.join("10-loop.conf"),
        "<fontconfig><include>../fonts.conf</include><dir>looped</dir></fontconfig>",
    )
    .unwrap();
    std::fs::write(conf_d.join("20-broken.conf"), "<fontconfig><dir>x</fontconfig").unwrap();
    // not NN-name.conf: never loaded
    std::fs::write(conf_d.join("local.conf"), "<fontconfig><dir>/nope</dir></fontconfig>").unwrap();
    std::fs::write(conf_d.join("README"), "<fontconfig><dir>/nope</dir></fontconfig>").unwrap();

    let index = FcFontIndex::new(FcIndexConfig {
        fonts_conf: Some(root.join("fonts.conf")),
        extra_dirs: vec![PathBuf::from("/extra")],
    });

    assert_eq!(
        index.font_directories().unwrap(),
        vec![
            root.join("first"),
            PathBuf::from("/opt/texlive/fonts/opentype"),
            conf_d.join("looped"),
            root.join("last"),
            PathBuf::from("/extra"),
        ]
    );
}

#[test]
fn test_is_conf_file() {
    assert!(is_conf_file(Path::new("/etc/fonts/conf.d/09-texlive.conf")));
    assert!(!is_conf_file(Path::new("/etc/fonts/conf.d/local.conf")));
    assert!(!is_conf_file(Path::new("/etc/fonts/conf.d/10-hinting.conf.bak")));
    assert!(!is_conf_file(Path::new("/etc/fonts/conf.d/README")));
}

#[test]
fn test_is_font_file() {
    assert!(is_font_file(Path::new("/usr/share/fonts/DejaVuSans.ttf")));
    assert!(is_font_file(Path::new("NotoSansCJK-Regular.TTC")));
    assert!(is_font_file(Path::new("a.woff2")));
    assert!(!is_font_file(Path::new("fonts.dir")));
    assert!(!is_font_file(Path::new("README")));
}

const TEST_FONT: &[u8] = include_bytes!("../tests/fonts/TestGlyphs-Regular.ttf");

#[test]
fn test_cmap_lookup() {
    // maps A-Z to glyphs 1-26 and U+263A to glyph 0
    let font = FcFont::from_bytes("TestGlyphs-Regular.ttf", TEST_FONT).unwrap();

    assert!(font.has_char('A').unwrap());
    assert!(font.has_char('Z').unwrap());
    assert!(!font.has_char('a').unwrap());
    assert!(!font.has_char('中').unwrap());
    assert!(!font.has_char('😀').unwrap());
    // .notdef does not count as a glyph
    assert!(!font.has_char('☺').unwrap());
}

#[test]
fn test_text_needs_every_character_in_one_font() {
    let font = FcFont::from_bytes("TestGlyphs-Regular.ttf", TEST_FONT).unwrap();

    assert!(font.has_text("ABC").unwrap());
    assert!(!font.has_text("ABc").unwrap());
    assert!(!font.has_text("A\u{301}").unwrap());
}

#[test]
fn test_font_without_cmap_is_rejected() {
    let err = FcFont::from_bytes("garbage.ttf", &[0, 1, 2, 3]).unwrap_err();
    assert!(matches!(err, Error::FontLoad { ref path, .. } if path == "garbage.ttf"));
}
