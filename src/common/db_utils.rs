// src/common/db_utils.rs

/// Monta o padrão `ILIKE` usado nas buscas textuais (`%termo%`).
/// Curingas digitados pelo usuário são escapados.
pub fn search_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Retorna o nome da constraint violada quando o erro é de unicidade.
pub fn unique_violation(e: &sqlx::Error) -> Option<String> {
    if let sqlx::Error::Database(db_err) = e {
        if db_err.is_unique_violation() {
            return Some(db_err.constraint().unwrap_or_default().to_string());
        }
    }
    None
}

pub fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}

/// Divide uma lista "a, b, c" em nomes limpos, ignorando vazios.
pub fn split_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_pattern_wraps_and_escapes() {
        assert_eq!(search_pattern(" parafuso "), "%parafuso%");
        assert_eq!(search_pattern("50%"), "%50\\%%");
        assert_eq!(search_pattern("a_b"), "%a\\_b%");
    }

    #[test]
    fn split_names_ignores_blanks() {
        assert_eq!(split_names("Acme, ,Beta ,"), vec!["Acme", "Beta"]);
        assert!(split_names("").is_empty());
    }
}
