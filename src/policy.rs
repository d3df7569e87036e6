//! Curated URL policy lists used by the trust classifier.
//!
//! Reputation is editorial: these lists are maintained by hand and kept as
//! plain data so they can be reviewed and tested without touching the
//! classifier logic.

/// Prefixes of pages that only confirm a vulnerability exists, not that
/// exploit code exists. Matching URLs are rejected outright.
pub const FORBIDDEN_PREFIXES: &[&str] = &[
    "https://vuldb.com/",                                          // vuln details
    "https://security.samsungmobile.com/",                         // vuln details
    "https://www.oracle.com/",                                     // vuln details
    "https://kb.netgear.com/",                                     // vuln details
    "https://usn.ubuntu.com/",                                     // vuln details
    "https://www.ubuntu.com/usn/",                                 // vuln details
    "https://www.qualcomm.com/company/product-security/bulletins", // vuln details
    "https://www.bentley.com/en/common-vulnerability-exposure/",   // vuln details
    "https://www.sap.com/documents/2022/02/fa865ea4-167e-0010-bca6-c68f7e60039b.html", // dead
    "https://www.foxit.com/support/security-bulletins.html",       // junk
    "https://www.foxitsoftware.com/support/security-bulletins.php", // junk
    "https://www.dlink.com/en/security-bulletin/",                 // junk
    "https://www.syss.de/pentest-blog/",                           // this specific endpoint
    "https://kc.mcafee.com/corporate/",                            // dead
    "https://tools.cisco.com/security/center/content/",            // vuln details
    "https://www.ibm.com/",                                        // vuln details
    "https://www.forescout.com/",                                  // vuln details
    "https://www.kb.cert.org/",                                    // vuln details
    "https://www.autodesk.com/trust/security-advisories/",         // vuln details
    "https://devolutions.net/security/advisories/",                // vuln details
    "https://nvidia.custhelp.com/app/answers/detail/a_id/",        // vuln details
    "https://cert.vde.com/en-us/advisories/vde-",                  // vuln details
    "https://www.coresecurity.com/?action=item",                   // this specific endpoint
    "https://support.hpe.com/hpsc/doc/public/",                    // vuln details
    "https://h20566.www2.hpe.com/",                                // dead
    "https://www.securityfocus.com/",                              // dead
    "https://docs.microsoft.com/en-us/security-updates/",          // vuln details
    "https://www.vmware.com/",                                     // junk
    "https://www.mandriva.com/",                                   // junk
    "https://www.cisco.com/warp/",                                 // junk
    "https://cdn.kernel.org/pub/linux/kernel/",                    // junk
    "https://www.redhat.com/support/errata/",                      // junk
    "https://sourceforge.net/",                                    // nothing
    "https://mattermost.com/security-updates/",                    // nothing
    "https://www-01.ibm.com/",                                     // vuln details
    "https://www.mozilla.org/security/",                           // vuln details
    "https://oval.cisecurity.org/repository/",                     // dead
    "https://www.osvdb.org/",                                      // dead
];

/// Exact dead-end URLs: listing pages with no advisory identifier.
pub const DEAD_END_URLS: &[&str] = &[
    "https://cert.vde.com/en-us/advisories/",
    "https://www.coresecurity.com/advisories",
];

/// The single (CVE, URL) pair allowed through the forbidden list.
///
/// The CERT/CC note for CVE-2019-19781 ships detection scripts alongside the
/// write-up, which is more than a bare existence notice. Kept at a reduced
/// score since the host is otherwise rejected.
pub const FORBIDDEN_EXCEPTION: (&str, &str, f64) = (
    "CVE-2019-19781",
    "https://www.kb.cert.org/vuls/id/619785",
    0.2,
);

/// URL-prefix renames for migrated sources, applied before any other check.
pub const PREFIX_RENAMES: &[(&str, &str)] = &[
    ("https://packetstormsecurity.com/", "https://packetstorm.news/"),
    ("https://packetstormsecurity.org/", "https://packetstorm.news/"),
    ("https://snyk.io/vuln/", "https://security.snyk.io/vuln/"),
    ("https://huntr.dev/", "https://huntr.com/"),
    ("https://wpvulndb.com/", "https://wpscan.com/"),
];

/// Prefix of the canonical reference database. Accepted at score 0.5 with a
/// trailing slash stripped.
pub const REFERENCE_DB_PREFIX: &str = "https://www.exploit-db.com";

/// Actively maintained PoC-index repositories, matched exactly. Score 0.9.
pub const HIGH_TRUST_EXACT: &[&str] = &[
    // More than 2k stars
    "https://github.com/qazbnm456/awesome-cve-poc",
    "https://github.com/tunz/js-vuln-db",
    "https://github.com/xairy/linux-kernel-exploitation",
    "https://github.com/Threekiii/Awesome-POC",
    "https://github.com/Mr-xn/Penetration_Testing_POC",
    // Less than 1k stars
    "https://github.com/ycdxsb/WindowsPrivilegeEscalation",
    "https://github.com/GhostTroops/TOP",
    "https://github.com/eeeeeeeeee-code/POC",
    "https://github.com/adysec/POC",
    "https://github.com/jiayy/android_vuln_poc-exp",
    "https://github.com/nu11secur1ty/Windows10Exploits",
    "https://github.com/Al1ex/LinuxEelvation",
    // Less than 200 stars
    "https://github.com/tzwlhack/Vulnerability",
    "https://github.com/NyxAzrael/Goby_POC",
    "https://github.com/ARPSyndicate/kenzer-templates",
    "https://github.com/DMW11525708/wiki",
    "https://github.com/JlSakuya/Linux-Privilege-Escalation-Exploits",
    // Archived but still valid
    "https://github.com/n0-traces/cve_monitor",
    "https://github.com/jev770/badmoodle-scan",
    "https://github.com/TinyNiko/android_bulletin_notes",
    "https://github.com/WindowsExploits/Exploits",
];

/// Vendor trackers and dedicated research platforms, matched by prefix.
/// Score 0.7.
pub const HIGH_TRUST_PREFIXES: &[&str] = &[
    "https://seclists.org/",
    "https://wpscan.com/",
    "https://packetstorm.news/",
    "https://security.snyk.io/",
    "https://talosintelligence.com/",
    "https://huntr.com/",
    "https://hackerone.com/",
    "https://www.tenable.com/",
    "https://www.openwall.com/",
    "https://securitylab.github.com/",
];

/// Blogs, generic hosts and known-noisy sources, matched by prefix.
/// Score 0.4.
pub const MEDIUM_TRUST_PREFIXES: &[&str] = &[
    // too generic
    "https://medium.com/",
    "https://gitlab.com/",
    "https://www.youtube.com/",
    "https://youtu.be/",
    "https://docs.google.com/",
    "https://gist.github.com/",
    // a personal choice, open to changes
    "https://www.syss.de/",
    "https://git.kernel.org/",
    "https://codevigilant.com/",
    "https://pierrekim.github.io/",
    "https://blog.nintechnet.com/",
    "https://blog.securityevaluators.com/",
    "https://aluigi.altervista.org/",
    "https://bugzilla.mozilla.org/show_bug.cgi",
    "https://bugzilla.redhat.com/show_bug.cgi",
    "https://blogs.gentoo.org/",
    "https://bugs.gentoo.org/",
    "https://marc.info/",
    "https://www.mend.io/vulnerability-database/",
    "https://www.whitesourcesoftware.com/",
    "https://www.vulnerability-lab.com/",
    "https://www.zeroscience.mk/",
    "https://evuln.com/",
    "https://www.evuln.com/",
    "https://securityreason.com/",
];

/// Generic code-hosting domains for the structural fallback check.
pub const CODE_HOSTING_DOMAINS: &[&str] = &[
    "github.com",
    "gitlab.com",
    "bitbucket.org",
    "gitee.com",
];
