use tracing::warn;

/// Директива строки с языком по умолчанию
const DEFAULT_DIRECTIVE: &str = "@default";

/// Результат разбора файла правил
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleFile {
    pub rules: Vec<(String, String)>,
    pub default_language: Option<String>,
}

/// Разобрать текст файла правил.
///
/// Формат: по одной паре `идентификатор язык` на строку, язык — последний
/// токен строки, поэтому идентификаторы с пробелами допустимы. Строка
/// `@default ЯЗЫК` задаёт язык по умолчанию. Пустые строки и строки,
/// начинающиеся с `#`, пропускаются. Некорректные строки пропускаются по
/// одной, не прерывая разбор всего файла.
pub fn parse(content: &str) -> RuleFile {
    let mut parsed = RuleFile::default();

    for (line_no, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(rest) = line.strip_prefix(DEFAULT_DIRECTIVE) {
            let language = rest.trim();
            if language.is_empty() || language.split_whitespace().count() != 1 {
                warn!(
                    "Строка {} файла правил: некорректная директива {}, пропускаем",
                    line_no + 1,
                    DEFAULT_DIRECTIVE
                );
                continue;
            }
            parsed.default_language = Some(language.to_string());
            continue;
        }

        match line.rsplit_once(char::is_whitespace) {
            Some((identity, language)) => {
                let identity = identity.trim();
                if identity.is_empty() || language.is_empty() {
                    warn!(
                        "Строка {} файла правил: пустой идентификатор или язык, пропускаем",
                        line_no + 1
                    );
                    continue;
                }
                parsed
                    .rules
                    .push((identity.to_string(), language.to_string()));
            }
            None => {
                warn!(
                    "Строка {} файла правил: нет пары 'идентификатор язык', пропускаем: '{}'",
                    line_no + 1,
                    line
                );
            }
        }
    }

    parsed
}

/// Сериализовать набор правил в текст файла.
///
/// Порядок детерминированный (по идентификатору), чтобы цикл
/// save -> load -> save был стабилен.
pub fn serialize<'a, I>(default_language: &str, rules: I) -> String
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    let mut entries: Vec<(&String, &String)> = rules.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let mut out = String::new();
    out.push_str(DEFAULT_DIRECTIVE);
    out.push(' ');
    out.push_str(default_language);
    out.push('\n');

    for (identity, language) in entries {
        out.push_str(identity);
        out.push(' ');
        out.push_str(language);
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let parsed = parse("code.exe EN\nnotepad.exe ZH\n");
        assert_eq!(
            parsed.rules,
            vec![
                ("code.exe".to_string(), "EN".to_string()),
                ("notepad.exe".to_string(), "ZH".to_string()),
            ]
        );
        assert_eq!(parsed.default_language, None);
    }

    #[test]
    fn test_parse_default_directive() {
        let parsed = parse("@default ZH\ncode.exe EN\n");
        assert_eq!(parsed.default_language, Some("ZH".to_string()));
        assert_eq!(parsed.rules.len(), 1);
    }

    #[test]
    fn test_parse_identity_with_spaces() {
        let parsed = parse("visual studio code.exe EN\n");
        assert_eq!(
            parsed.rules,
            vec![("visual studio code.exe".to_string(), "EN".to_string())]
        );
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let parsed = parse("одинокий_токен\n\n# комментарий\ncode.exe EN\n@default\n");
        assert_eq!(
            parsed.rules,
            vec![("code.exe".to_string(), "EN".to_string())]
        );
        assert_eq!(parsed.default_language, None);
    }

    #[test]
    fn test_serialize_is_sorted_and_round_trips() {
        let rules = vec![
            ("notepad.exe".to_string(), "ZH".to_string()),
            ("a b c.exe".to_string(), "EN".to_string()),
        ];
        let text = serialize("RU", rules.iter().map(|(k, v)| (k, v)));

        let reparsed = parse(&text);
        assert_eq!(reparsed.default_language, Some("RU".to_string()));
        assert_eq!(
            reparsed.rules,
            vec![
                ("a b c.exe".to_string(), "EN".to_string()),
                ("notepad.exe".to_string(), "ZH".to_string()),
            ]
        );

        // Повторная сериализация даёт тот же текст
        let rules2: Vec<(String, String)> = reparsed.rules;
        let text2 = serialize("RU", rules2.iter().map(|(k, v)| (k, v)));
        assert_eq!(text, text2);
    }
}
