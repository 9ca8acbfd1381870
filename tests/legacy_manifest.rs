//! Integration test parsing the legacy deployment's requirements manifest

use filmgate::manifest::{Manifest, ManifestError, Requirement};

const LEGACY_MANIFEST: &str = "\
# Bot dependencies
aiohttp
pyrofork
python-dotenv
tgcrypto
motor
aiofiles
dnspython
requests
jinja2

# Flask API dependencies
flask==2.2.2
flask-cors==4.0.1
flask-caching==2.1.0
tmdbv3api==1.9.0
redis==5.0.8
gunicorn==20.1.0  # production WSGI server
";

#[test]
fn legacy_manifest_has_two_labeled_groups() -> Result<(), ManifestError> {
    let manifest = Manifest::parse(LEGACY_MANIFEST)?;

    assert_eq!(manifest.groups.len(), 2);
    assert_eq!(
        manifest.groups[0].label.as_deref(),
        Some("Bot dependencies")
    );
    assert_eq!(
        manifest.groups[1].label.as_deref(),
        Some("Flask API dependencies")
    );
    Ok(())
}

#[test]
fn bot_dependencies_are_unpinned() -> Result<(), ManifestError> {
    let manifest = Manifest::parse(LEGACY_MANIFEST)?;
    let bot = &manifest.groups[0];

    let names: Vec<&str> = bot.requirements.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "aiohttp",
            "pyrofork",
            "python-dotenv",
            "tgcrypto",
            "motor",
            "aiofiles",
            "dnspython",
            "requests",
            "jinja2",
        ]
    );
    assert!(bot.requirements.iter().all(|r| !r.is_pinned()));
    Ok(())
}

#[test]
fn api_dependencies_are_pinned() -> Result<(), ManifestError> {
    let manifest = Manifest::parse(LEGACY_MANIFEST)?;
    let api = &manifest.groups[1];

    let pins: Vec<(&str, Option<&str>)> = api
        .requirements
        .iter()
        .map(|r| (r.name.as_str(), r.version.as_deref()))
        .collect();
    assert_eq!(
        pins,
        [
            ("flask", Some("2.2.2")),
            ("flask-cors", Some("4.0.1")),
            ("flask-caching", Some("2.1.0")),
            ("tmdbv3api", Some("1.9.0")),
            ("redis", Some("5.0.8")),
            ("gunicorn", Some("20.1.0")),
        ]
    );
    Ok(())
}

#[test]
fn exactly_one_inline_comment() -> Result<(), ManifestError> {
    let manifest = Manifest::parse(LEGACY_MANIFEST)?;

    let comments: Vec<&Requirement> = manifest
        .groups
        .iter()
        .flat_map(|g| &g.requirements)
        .filter(|r| r.comment.is_some())
        .collect();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].name, "gunicorn");
    Ok(())
}

#[test]
fn summary_matches_group_shape() -> Result<(), ManifestError> {
    let manifest = Manifest::parse(LEGACY_MANIFEST)?;
    let summary = manifest.summary();

    assert_eq!(summary.groups, 2);
    assert_eq!(summary.unpinned, 9);
    assert_eq!(summary.pinned, 6);
    assert_eq!(summary.to_string(), "2 group(s), 6 pinned, 9 unpinned");
    Ok(())
}
