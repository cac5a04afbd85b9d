//! Ready-made [`LexerConfig`] values for common line-oriented configuration
//! file formats. Each marker set is taken from that format's real grammar,
//! not guessed: a crate that only let callers build configs from scratch
//! would be unusable on the very file formats it's named after.
//!
//! Every preset calls [`LexerConfig::validate`] before returning, so a
//! caller can hand the result straight to [`crate::scanner::run`].

use crate::config::{LexerConfig, SectionStyle};
use crate::entity::CommentStyle;

fn hash_to_newline() -> CommentStyle {
    CommentStyle {
        opening: "#".into(),
        closing: "\n".into(),
    }
}

fn built(cfg: LexerConfig) -> LexerConfig {
    let mut cfg = cfg;
    cfg.validate().expect("built-in preset must be internally consistent");
    cfg
}

/// Flat `key = value` files, `#` comments, quoted values, no sections.
/// Used for `/etc/sysconfig/*`-style files.
pub fn generic_sysconfig() -> LexerConfig {
    built(LexerConfig {
        statement_ending_markers: vec!["\n".into()],
        comment_styles: vec![hash_to_newline()],
        text_quote_style: vec!["\"".into()],
        token_break_markers: vec!["=".into()],
        ..Default::default()
    })
}

/// `/etc/sysctl.conf`: flat `key = value`, `#` comments, no quoting.
pub fn sysctl_conf() -> LexerConfig {
    built(LexerConfig {
        statement_ending_markers: vec!["\n".into()],
        comment_styles: vec![hash_to_newline()],
        token_break_markers: vec!["=".into()],
        ..Default::default()
    })
}

/// systemd unit files: `[Section]` headings, `key=value`, `#` comments.
pub fn systemd_unit() -> LexerConfig {
    built(LexerConfig {
        statement_ending_markers: vec!["\n".into()],
        comment_styles: vec![hash_to_newline()],
        text_quote_style: vec!["\"".into()],
        token_break_markers: vec!["=".into()],
        section_style: SectionStyle {
            opening_prefix: "[".into(),
            opening_suffix: "]".into(),
            open_section_with_a_statement: true,
            ..Default::default()
        },
        ..Default::default()
    })
}

/// `/etc/hosts`: whitespace-separated columns, `#` comments, no sections.
pub fn hosts() -> LexerConfig {
    built(LexerConfig {
        statement_ending_markers: vec!["\n".into()],
        comment_styles: vec![hash_to_newline()],
        ..Default::default()
    })
}

/// `/etc/login.defs`: tab/space-separated `KEY value` pairs, `#` comments.
pub fn login_defs() -> LexerConfig {
    built(LexerConfig {
        statement_ending_markers: vec!["\n".into()],
        comment_styles: vec![hash_to_newline()],
        ..Default::default()
    })
}

/// `/etc/nsswitch.conf`: `database: service...` lines, `#` comments.
pub fn nsswitch_conf() -> LexerConfig {
    built(LexerConfig {
        statement_ending_markers: vec!["\n".into()],
        comment_styles: vec![hash_to_newline()],
        ..Default::default()
    })
}

/// Apache `httpd.conf`: `<Directive ...>...</Directive>` blocks, `\`
/// continuations, `#` comments, `:`-broken tokens.
pub fn httpd_conf() -> LexerConfig {
    built(LexerConfig {
        statement_continuation_markers: vec!["\\".into()],
        statement_ending_markers: vec!["\n".into()],
        comment_styles: vec![hash_to_newline()],
        text_quote_style: vec!["\"".into(), "'".into()],
        token_break_markers: vec![":".into()],
        section_style: SectionStyle {
            opening_prefix: "<".into(),
            opening_suffix: ">".into(),
            closing_prefix: "</".into(),
            closing_suffix: ">".into(),
            open_section_with_a_statement: true,
            close_section_with_a_statement: true,
        },
        ..Default::default()
    })
}

/// BIND `named.conf`: `stanza { ... };` blocks, C/C++/shell-style comments.
pub fn named_conf() -> LexerConfig {
    built(LexerConfig {
        statement_continuation_markers: vec!["\\".into()],
        statement_ending_markers: vec![";\n".into(), ";".into()],
        comment_styles: vec![
            CommentStyle { opening: "/*".into(), closing: "*/".into() },
            CommentStyle { opening: "//".into(), closing: "\n".into() },
            hash_to_newline(),
        ],
        text_quote_style: vec!["\"".into(), "'".into()],
        section_style: SectionStyle {
            opening_suffix: "{".into(),
            closing_suffix: "};".into(),
            open_section_with_a_statement: true,
            ..Default::default()
        },
        ..Default::default()
    })
}

/// A BIND zone file's `$ORIGIN`/SOA records, with `( ... )` multi-line
/// parenthesized record bodies and `;` comments.
pub fn named_zone() -> LexerConfig {
    built(LexerConfig {
        statement_ending_markers: vec!["\n".into()],
        comment_styles: vec![CommentStyle { opening: ";".into(), closing: "\n".into() }],
        section_style: SectionStyle {
            opening_suffix: "(".into(),
            closing_suffix: ");".into(),
            open_section_with_a_statement: true,
            ..Default::default()
        },
        ..Default::default()
    })
}

/// ISC `dhcpd.conf`: `subnet ... { ... }` blocks, `#` comments, quoted
/// option strings.
pub fn dhcpd_conf() -> LexerConfig {
    built(LexerConfig {
        statement_ending_markers: vec![";\n".into(), ";".into()],
        comment_styles: vec![hash_to_newline()],
        text_quote_style: vec!["\"".into()],
        section_style: SectionStyle {
            opening_suffix: "{".into(),
            closing_suffix: "}".into(),
            open_section_with_a_statement: true,
            ..Default::default()
        },
        ..Default::default()
    })
}

/// `/etc/ntp.conf`: flat directive lines, `#` comments, quoted values.
pub fn ntp_conf() -> LexerConfig {
    built(LexerConfig {
        statement_ending_markers: vec!["\n".into()],
        comment_styles: vec![hash_to_newline()],
        text_quote_style: vec!["\"".into()],
        ..Default::default()
    })
}

/// `/etc/security/limits.conf`: flat column-based directives, `#` comments.
pub fn limits_conf() -> LexerConfig {
    built(LexerConfig {
        statement_ending_markers: vec!["\n".into()],
        comment_styles: vec![hash_to_newline()],
        text_quote_style: vec!["\"".into()],
        ..Default::default()
    })
}

/// Postfix `main.cf`: `key = value`, `#` comments, and continuation lines
/// that start with a space rather than an escape character.
pub fn postfix_main_cf() -> LexerConfig {
    built(LexerConfig {
        statement_continuation_markers: vec!["\n ".into()],
        statement_ending_markers: vec!["\n".into()],
        comment_styles: vec![hash_to_newline()],
        token_break_markers: vec!["=".into()],
        ..Default::default()
    })
}

/// A crontab: `min hour dom month dow command` lines, `#` comments.
pub fn crontab() -> LexerConfig {
    built(LexerConfig {
        statement_ending_markers: vec!["\n".into()],
        comment_styles: vec![hash_to_newline()],
        ..Default::default()
    })
}

/// `cron.allow`/`cron.deny`: one username per line, no comment syntax at all.
pub fn cron_allow() -> LexerConfig {
    built(LexerConfig {
        statement_ending_markers: vec!["\n".into()],
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! preset_tests {
        ($($name:ident => $preset:expr),+ $(,)?) => {
            $(
                #[test]
                fn $name() {
                    let mut cfg = $preset;
                    assert!(cfg.validate().is_ok(), "{} must stay valid after a second resolve", stringify!($name));
                }
            )+
        };
    }

    preset_tests! {
        generic_sysconfig_is_valid => generic_sysconfig(),
        sysctl_conf_is_valid => sysctl_conf(),
        systemd_unit_is_valid => systemd_unit(),
        hosts_is_valid => hosts(),
        login_defs_is_valid => login_defs(),
        nsswitch_conf_is_valid => nsswitch_conf(),
        httpd_conf_is_valid => httpd_conf(),
        named_conf_is_valid => named_conf(),
        named_zone_is_valid => named_zone(),
        dhcpd_conf_is_valid => dhcpd_conf(),
        ntp_conf_is_valid => ntp_conf(),
        limits_conf_is_valid => limits_conf(),
        postfix_main_cf_is_valid => postfix_main_cf(),
        crontab_is_valid => crontab(),
        cron_allow_is_valid => cron_allow(),
    }

    #[test]
    fn systemd_unit_resolves_flat_double_anchor_sections() {
        use crate::config::SectionMatchMechanism;
        let cfg = systemd_unit();
        assert_eq!(
            cfg.section_style.section_match_mechanism,
            SectionMatchMechanism::FlatDoubleAnchor
        );
    }

    #[test]
    fn named_conf_resolves_nested_double_anchor_sections() {
        use crate::config::SectionMatchMechanism;
        let cfg = named_conf();
        assert_eq!(
            cfg.section_style.section_match_mechanism,
            SectionMatchMechanism::NestedDoubleAnchor
        );
    }

    #[test]
    fn httpd_conf_resolves_nested_quad_anchor_sections() {
        use crate::config::SectionMatchMechanism;
        let cfg = httpd_conf();
        assert_eq!(
            cfg.section_style.section_match_mechanism,
            SectionMatchMechanism::NestedQuadAnchor
        );
    }

    #[test]
    fn cron_allow_has_no_comment_syntax() {
        assert!(cron_allow().comment_styles.is_empty());
    }
}
