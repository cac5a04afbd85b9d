//! One validity check per named preset, run as a crate-level integration
//! test rather than only inline in `presets.rs`, so a preset that stops
//! validating shows up as a top-level test failure a consumer would notice.

use linelex::presets;

macro_rules! preset_validates {
    ($($test_name:ident => $preset_fn:ident),+ $(,)?) => {
        $(
            #[test]
            fn $test_name() {
                let mut cfg = presets::$preset_fn();
                assert!(cfg.validate().is_ok());
            }
        )+
    };
}

preset_validates! {
    generic_sysconfig_validates => generic_sysconfig,
    sysctl_conf_validates => sysctl_conf,
    systemd_unit_validates => systemd_unit,
    hosts_validates => hosts,
    login_defs_validates => login_defs,
    nsswitch_conf_validates => nsswitch_conf,
    httpd_conf_validates => httpd_conf,
    named_conf_validates => named_conf,
    named_zone_validates => named_zone,
    dhcpd_conf_validates => dhcpd_conf,
    ntp_conf_validates => ntp_conf,
    limits_conf_validates => limits_conf,
    postfix_main_cf_validates => postfix_main_cf,
    crontab_validates => crontab,
    cron_allow_validates => cron_allow,
}
