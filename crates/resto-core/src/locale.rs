//! # Locale
//!
//! French strings for authentication messages and role names.
//!
//! Keys are flat; placeholders are written `:name` and filled by
//! [`translate_with`].

/// Authentication table.
const AUTH_FR: &[(&str, &str)] = &[
    ("failed", "Ces identifiants ne correspondent pas à nos enregistrements."),
    ("password", "Le mot de passe fourni est incorrect."),
    (
        "throttle",
        "Trop de tentatives de connexion. Veuillez essayer de nouveau dans :seconds secondes.",
    ),
    ("inactive", "Ce compte a été désactivé. Contactez un administrateur."),
    ("unauthenticated", "Veuillez vous connecter pour continuer."),
    ("forbidden", "Vous n'avez pas l'autorisation d'accéder à cette page."),
    ("logged_out", "Vous avez été déconnecté."),
    ("session_expired", "Votre session a expiré. Veuillez vous reconnecter."),
    ("roles.admin", "Administrateur"),
    ("roles.caissier", "Caissier"),
    ("roles.gestionnaire_stock", "Gestionnaire de stock"),
];

/// Looks up `key`; unknown keys come back unchanged.
pub fn translate(key: &str) -> String {
    AUTH_FR
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| (*v).to_string())
        .unwrap_or_else(|| key.to_string())
}

/// Looks up `key` and replaces each `:name` with its value.
///
/// ```rust
/// use resto_core::locale::translate_with;
///
/// let msg = translate_with("throttle", &[("seconds", "42")]);
/// assert!(msg.ends_with("dans 42 secondes."));
/// ```
pub fn translate_with(key: &str, replacements: &[(&str, &str)]) -> String {
    let mut line = translate(key);
    for (name, value) in replacements {
        line = line.replace(&format!(":{}", name), value);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_keys() {
        assert_eq!(
            translate("failed"),
            "Ces identifiants ne correspondent pas à nos enregistrements."
        );
        assert_eq!(translate("password"), "Le mot de passe fourni est incorrect.");
        assert_eq!(translate("roles.gestionnaire_stock"), "Gestionnaire de stock");
    }

    #[test]
    fn test_unknown_key_returns_key() {
        assert_eq!(translate("auth.nope"), "auth.nope");
    }

    #[test]
    fn test_throttle_placeholder() {
        assert_eq!(
            translate_with("throttle", &[("seconds", "60")]),
            "Trop de tentatives de connexion. Veuillez essayer de nouveau dans 60 secondes."
        );
    }

    #[test]
    fn test_unused_replacement_is_ignored() {
        assert_eq!(
            translate_with("password", &[("seconds", "1")]),
            translate("password")
        );
    }
}
