use serde::Serialize;

/// Display names of a release codename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseInfo {
    pub codename: String,
    /// e.g. "Ubuntu 22.04 LTS"
    pub title: String,
    /// e.g. "Jammy Jellyfish"
    pub name: String,
}

const KNOWN: &[(&str, &str, &str)] = &[
    ("focal", "20.04 LTS", "Focal Fossa"),
    ("jammy", "22.04 LTS", "Jammy Jellyfish"),
    ("noble", "24.04 LTS", "Noble Numbat"),
];

impl ReleaseInfo {
    pub fn for_codename(codename: &str) -> Self {
        match KNOWN.iter().find(|(known, _, _)| *known == codename) {
            Some((_, version, name)) => Self {
                codename: codename.to_string(),
                title: format!("Ubuntu {}", version),
                name: name.to_string(),
            },
            None => Self {
                codename: codename.to_string(),
                title: format!("Ubuntu {}", codename),
                name: capitalize(codename),
            },
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
