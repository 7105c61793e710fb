// SPF Safe Shell - Operation Catalogue
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// The complete capability surface. A closed enum: adding an operation
// means adding a variant, a name, a description and a policy here, and
// nowhere else. Nothing is registered at runtime.
//
// Allowlists are spelled out per command. A flag missing from a list is
// refused; that is the intended failure mode.

use crate::policy::{
    ArgumentFilter, Clusters, Denylist, FlagAllowlist, ListingGate, Policy, Rule,
    SubcommandGate, TokenSet, VariantGate,
};

// ============================================================================
// SHARED TOKEN SETS
// ============================================================================

/// Flags that make a wrapped tool start another program.
pub const EXECUTION_TOKENS: TokenSet = TokenSet {
    name: "executes programs",
    tokens: &["-exec", "-execdir", "-ok", "-okdir", "--pre", "--exec"],
};

/// Flags that make a wrapped tool create, overwrite or delete files.
pub const FILE_WRITE_TOKENS: TokenSet = TokenSet {
    name: "writes files",
    tokens: &["-delete", "-fprint", "-fprint0", "-fprintf", "-fls", "--output"],
};

/// In-place edit flags of stream editors and structured-data tools.
pub const IN_PLACE_TOKENS: TokenSet = TokenSet {
    name: "edits in place",
    tokens: &["-i", "--in-place", "--inplace"],
};

const YQ_SPLIT_TOKENS: TokenSet = TokenSet {
    name: "splits into files",
    tokens: &["-s", "--split-exp", "--split-exp-file"],
};

const GIT_PAGER_TOKENS: TokenSet = TokenSet {
    name: "runs pager or external diff",
    tokens: &["-O", "--open-files-in-pager", "--ext-diff"],
};

/// Git never takes optional index locks (no stat refresh writes) and
/// refuses abbreviated long options outright.
const GIT_ENV: &[(&str, &str)] = &[
    ("GIT_OPTIONAL_LOCKS", "0"),
    ("GIT_TEST_DISALLOW_ABBREVIATED_OPTIONS", "1"),
];

/// Colour output would put terminal control sequences into relayed text.
const COLOR_FILTER: ArgumentFilter = ArgumentFilter { drop: &["--color", "--colour"] };

// ============================================================================
// OPERATIONS
// ============================================================================

/// One named, policy-governed capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListDirectory,
    DirectoryTree,
    SafeFind,
    DiskUsage,
    DiskFree,
    FileInfo,
    FileType,
    ResolvePath,
    ViewFile,
    FileHead,
    FileTail,
    WordCount,
    HexDump,
    NumberLines,
    SearchText,
    Ripgrep,
    SearchReplace,
    SortLines,
    CompareFiles,
    Checksum,
    ListArchive,
    ListZip,
    QueryJson,
    QueryYaml,
    ListProcesses,
    ShowEnvironment,
    SystemInfo,
    CurrentUser,
    LocateCommand,
    GitQuery,
}

impl Operation {
    /// Every operation, in announcement order.
    pub const ALL: &'static [Operation] = &[
        Operation::ListDirectory,
        Operation::DirectoryTree,
        Operation::SafeFind,
        Operation::DiskUsage,
        Operation::DiskFree,
        Operation::FileInfo,
        Operation::FileType,
        Operation::ResolvePath,
        Operation::ViewFile,
        Operation::FileHead,
        Operation::FileTail,
        Operation::WordCount,
        Operation::HexDump,
        Operation::NumberLines,
        Operation::SearchText,
        Operation::Ripgrep,
        Operation::SearchReplace,
        Operation::SortLines,
        Operation::CompareFiles,
        Operation::Checksum,
        Operation::ListArchive,
        Operation::ListZip,
        Operation::QueryJson,
        Operation::QueryYaml,
        Operation::ListProcesses,
        Operation::ShowEnvironment,
        Operation::SystemInfo,
        Operation::CurrentUser,
        Operation::LocateCommand,
        Operation::GitQuery,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::ListDirectory => "list-directory",
            Operation::DirectoryTree => "directory-tree",
            Operation::SafeFind => "safe-find",
            Operation::DiskUsage => "disk-usage",
            Operation::DiskFree => "disk-free",
            Operation::FileInfo => "file-info",
            Operation::FileType => "file-type",
            Operation::ResolvePath => "resolve-path",
            Operation::ViewFile => "view-file",
            Operation::FileHead => "file-head",
            Operation::FileTail => "file-tail",
            Operation::WordCount => "word-count",
            Operation::HexDump => "hex-dump",
            Operation::NumberLines => "number-lines",
            Operation::SearchText => "search-text",
            Operation::Ripgrep => "ripgrep",
            Operation::SearchReplace => "search-replace",
            Operation::SortLines => "sort-lines",
            Operation::CompareFiles => "compare-files",
            Operation::Checksum => "checksum",
            Operation::ListArchive => "list-archive",
            Operation::ListZip => "list-zip",
            Operation::QueryJson => "query-json",
            Operation::QueryYaml => "query-yaml",
            Operation::ListProcesses => "list-processes",
            Operation::ShowEnvironment => "show-environment",
            Operation::SystemInfo => "system-info",
            Operation::CurrentUser => "current-user",
            Operation::LocateCommand => "locate-command",
            Operation::GitQuery => "git-query",
        }
    }

    /// Registry lookup. Unknown names have no operation.
    pub fn from_name(name: &str) -> Option<Operation> {
        Self::ALL.iter().copied().find(|op| op.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            Operation::ListDirectory => "List directory contents (ls). Flags are allowlisted.",
            Operation::DirectoryTree => "Show a directory tree (tree). Output-file flags are refused.",
            Operation::SafeFind => "Find files (find). -exec, -ok, -delete and -fprint* are refused.",
            Operation::DiskUsage => "Estimate file space usage (du).",
            Operation::DiskFree => "Report filesystem space usage (df).",
            Operation::FileInfo => "Display file status (stat).",
            Operation::FileType => "Determine file type (file). Magic compilation is refused.",
            Operation::ResolvePath => "Print the resolved absolute path (realpath).",
            Operation::ViewFile => "Print file contents (cat).",
            Operation::FileHead => "Print the first lines of a file (head).",
            Operation::FileTail => "Print the last lines of a file (tail). Follow mode is refused.",
            Operation::WordCount => "Count lines, words and bytes (wc).",
            Operation::HexDump => "Dump file bytes in octal, hex or characters (od).",
            Operation::NumberLines => "Print a file with line numbers (nl).",
            Operation::SearchText => "Search file contents with a pattern (grep).",
            Operation::Ripgrep => "Recursively search file contents (rg). Preprocessors are refused.",
            Operation::SearchReplace => {
                "Stream search-and-replace to stdout (sed --sandbox). In-place editing is refused."
            }
            Operation::SortLines => "Sort lines of text files (sort). Output-file flags are refused.",
            Operation::CompareFiles => "Compare files line by line (diff).",
            Operation::Checksum => {
                "Compute or verify checksums. First argument selects the algorithm: \
                 md5, sha1, sha224, sha256, sha384, sha512, b2."
            }
            Operation::ListArchive => "List tar archive contents (tar). Requires -t or --list.",
            Operation::ListZip => "List zip archive contents (unzip). First argument must be -l, -v, -Z or -t.",
            Operation::QueryJson => "Query JSON documents (jq).",
            Operation::QueryYaml => "Query YAML documents (yq). In-place edits and splitting are refused.",
            Operation::ListProcesses => "Report running processes (ps).",
            Operation::ShowEnvironment => "Print environment variables (printenv).",
            Operation::SystemInfo => "Print system information (uname).",
            Operation::CurrentUser => "Print user and group identity (id).",
            Operation::LocateCommand => "Locate a command on PATH (which).",
            Operation::GitQuery => {
                "Read-only git queries. First argument must be one of: status, log, show, diff, \
                 blame, ls-files, ls-tree, rev-parse, describe, shortlog, grep, cat-file, \
                 show-ref, for-each-ref, rev-list, name-rev, merge-base, count-objects."
            }
        }
    }

    /// Policy descriptor. Static data; the same value on every call.
    pub fn policy(self) -> Policy {
        match self {
            Operation::ListDirectory => allow_filtered("ls", LS_FLAGS),
            Operation::DirectoryTree => allow_filtered("tree", TREE_FLAGS),
            Operation::SafeFind => Policy {
                command: "find",
                leading_args: &[],
                env: &[],
                rule: Rule::Deny(Denylist {
                    sets: &[&EXECUTION_TOKENS, &FILE_WRITE_TOKENS],
                    clusters: Clusters::Literal,
                }),
                filter: None,
            },
            Operation::DiskUsage => allow("du", DU_FLAGS),
            Operation::DiskFree => allow("df", DF_FLAGS),
            Operation::FileInfo => allow("stat", STAT_FLAGS),
            Operation::FileType => allow("file", FILE_FLAGS),
            Operation::ResolvePath => allow("realpath", REALPATH_FLAGS),
            Operation::ViewFile => allow("cat", CAT_FLAGS),
            Operation::FileHead => allow("head", HEAD_FLAGS),
            Operation::FileTail => allow("tail", TAIL_FLAGS),
            Operation::WordCount => allow("wc", WC_FLAGS),
            Operation::HexDump => allow("od", OD_FLAGS),
            Operation::NumberLines => allow("nl", NL_FLAGS),
            Operation::SearchText => allow_filtered("grep", GREP_FLAGS),
            Operation::Ripgrep => Policy {
                command: "rg",
                leading_args: &[],
                env: &[],
                rule: Rule::Deny(Denylist { sets: &[&EXECUTION_TOKENS], clusters: Clusters::Literal }),
                filter: None,
            },
            Operation::SearchReplace => Policy {
                command: "sed",
                leading_args: &["--sandbox"],
                env: &[],
                rule: Rule::Deny(Denylist { sets: &[&IN_PLACE_TOKENS], clusters: Clusters::Expand }),
                filter: None,
            },
            Operation::SortLines => allow("sort", SORT_FLAGS),
            Operation::CompareFiles => allow("diff", DIFF_FLAGS),
            Operation::Checksum => Policy {
                command: "sha256sum",
                leading_args: &[],
                env: &[],
                rule: Rule::Variant(VariantGate {
                    variants: &[
                        ("md5", "md5sum"),
                        ("sha1", "sha1sum"),
                        ("sha224", "sha224sum"),
                        ("sha256", "sha256sum"),
                        ("sha384", "sha384sum"),
                        ("sha512", "sha512sum"),
                        ("b2", "b2sum"),
                    ],
                    flags: FlagAllowlist { flags: CHECKSUM_FLAGS },
                }),
                filter: None,
            },
            Operation::ListArchive => Policy {
                command: "tar",
                // `host:path` archives would otherwise start rsh/ssh
                leading_args: &["--force-local"],
                env: &[],
                rule: Rule::Listing(ListingGate {
                    listing: &["-t", "--list"],
                    flags: FlagAllowlist { flags: TAR_FLAGS },
                    leading: false,
                }),
                filter: None,
            },
            Operation::ListZip => Policy {
                command: "unzip",
                leading_args: &[],
                env: &[],
                rule: Rule::Listing(ListingGate {
                    listing: &["-l", "-v", "-Z", "-t"],
                    flags: FlagAllowlist { flags: UNZIP_FLAGS },
                    leading: true,
                }),
                filter: None,
            },
            Operation::QueryJson => allow("jq", JQ_FLAGS),
            Operation::QueryYaml => Policy {
                command: "yq",
                leading_args: &[],
                env: &[],
                rule: Rule::Deny(Denylist {
                    sets: &[&IN_PLACE_TOKENS, &YQ_SPLIT_TOKENS],
                    clusters: Clusters::Expand,
                }),
                filter: None,
            },
            Operation::ListProcesses => allow("ps", PS_FLAGS),
            Operation::ShowEnvironment => allow("printenv", PRINTENV_FLAGS),
            Operation::SystemInfo => allow("uname", UNAME_FLAGS),
            Operation::CurrentUser => allow("id", ID_FLAGS),
            Operation::LocateCommand => allow("which", WHICH_FLAGS),
            Operation::GitQuery => Policy {
                command: "git",
                leading_args: &["--no-pager", "-c", "core.fsmonitor=false"],
                env: GIT_ENV,
                rule: Rule::Subcommand(SubcommandGate {
                    subcommands: GIT_SUBCOMMANDS,
                    deny: Denylist {
                        sets: &[&FILE_WRITE_TOKENS, &GIT_PAGER_TOKENS],
                        clusters: Clusters::Expand,
                    },
                }),
                filter: Some(COLOR_FILTER),
            },
        }
    }
}

fn allow(command: &'static str, flags: &'static [&'static str]) -> Policy {
    Policy { command, leading_args: &[], env: &[], rule: Rule::Allow(FlagAllowlist { flags }), filter: None }
}

fn allow_filtered(command: &'static str, flags: &'static [&'static str]) -> Policy {
    Policy {
        command,
        leading_args: &[],
        env: &[],
        rule: Rule::Allow(FlagAllowlist { flags }),
        filter: Some(COLOR_FILTER),
    }
}

// ============================================================================
// ALLOWLISTS
// ============================================================================

const LS_FLAGS: &[&str] = &[
    "-a", "-A", "-l", "-h", "-R", "-r", "-t", "-S", "-1", "-d", "-F", "-i", "-n", "-g", "-o",
    "-G", "-s", "-U", "-X", "-v", "-c", "-u", "-L", "-H", "-p", "-m", "-x", "-C", "-k",
    "--all", "--almost-all", "--human-readable", "--recursive", "--reverse", "--directory",
    "--classify", "--inode", "--numeric-uid-gid", "--size", "--sort", "--time", "--time-style",
    "--full-time", "--group-directories-first", "--ignore", "--hide", "--dereference",
    "--format", "--width", "--color", "--colour", "--block-size", "--si", "--literal",
    "--quoting-style", "--escape", "--indicator-style", "--file-type",
];

const TREE_FLAGS: &[&str] = &[
    "-a", "-d", "-f", "-i", "-l", "-x", "-L", "-P", "-I", "-p", "-u", "-g", "-s", "-h", "-D",
    "-F", "-q", "-N", "-Q", "-v", "-t", "-c", "-r", "-n", "-C", "-J", "-X",
    "--noreport", "--dirsfirst", "--filelimit", "--prune", "--matchdirs", "--ignore-case",
    "--du", "--si", "--inodes", "--device", "--charset", "--sort", "--gitignore", "--color",
];

const DU_FLAGS: &[&str] = &[
    "-a", "-b", "-c", "-d", "-h", "-k", "-m", "-s", "-x", "-L", "-H", "-P", "-S", "-0",
    "--all", "--apparent-size", "--bytes", "--total", "--max-depth", "--human-readable",
    "--summarize", "--one-file-system", "--dereference", "--separate-dirs", "--si",
    "--block-size", "--exclude", "--threshold", "--time", "--null", "--inodes",
];

const DF_FLAGS: &[&str] = &[
    "-a", "-h", "-H", "-i", "-k", "-l", "-P", "-T", "-t", "-x", "-B",
    "--all", "--human-readable", "--si", "--inodes", "--local", "--portability",
    "--print-type", "--type", "--exclude-type", "--total", "--output", "--block-size",
];

const STAT_FLAGS: &[&str] = &[
    "-L", "-f", "-c", "-t", "--dereference", "--file-system", "--format", "--printf",
    "--terse", "--cached",
];

const FILE_FLAGS: &[&str] = &[
    "-b", "-i", "-L", "-h", "-z", "-Z", "-k", "-s", "-N", "-r", "-0", "-e", "-F", "-E", "-p",
    "--brief", "--mime", "--mime-type", "--mime-encoding", "--dereference",
    "--no-dereference", "--uncompress", "--special-files", "--no-pad", "--keep-going",
    "--raw", "--print0", "--exclude", "--separator", "--extension", "--apple",
];

const REALPATH_FLAGS: &[&str] = &[
    "-e", "-m", "-s", "-q", "-z", "-L", "-P", "--canonicalize-existing",
    "--canonicalize-missing", "--no-symlinks", "--strip", "--quiet", "--zero",
    "--logical", "--physical", "--relative-to", "--relative-base",
];

const CAT_FLAGS: &[&str] = &[
    "-A", "-b", "-e", "-E", "-n", "-s", "-t", "-T", "-u", "-v",
    "--show-all", "--number-nonblank", "--show-ends", "--number", "--squeeze-blank",
    "--show-tabs", "--show-nonprinting",
];

const HEAD_FLAGS: &[&str] = &["-n", "-c", "-q", "-v", "-z", "--lines", "--bytes", "--quiet", "--silent", "--verbose", "--zero-terminated"];

const TAIL_FLAGS: &[&str] = &["-n", "-c", "-q", "-v", "-z", "--lines", "--bytes", "--quiet", "--silent", "--verbose", "--zero-terminated"];

const WC_FLAGS: &[&str] = &[
    "-l", "-w", "-c", "-m", "-L", "--lines", "--words", "--bytes", "--chars",
    "--max-line-length", "--files0-from", "--total",
];

const OD_FLAGS: &[&str] = &[
    "-A", "-j", "-N", "-t", "-v", "-w", "-a", "-b", "-c", "-d", "-f", "-i", "-l", "-o", "-s",
    "-x", "--address-radix", "--skip-bytes", "--read-bytes", "--format",
    "--output-duplicates", "--width", "--endian", "--strings",
];

const NL_FLAGS: &[&str] = &[
    "-b", "-d", "-f", "-h", "-i", "-l", "-n", "-p", "-s", "-v", "-w",
    "--body-numbering", "--section-delimiter", "--footer-numbering", "--header-numbering",
    "--line-increment", "--join-blank-lines", "--number-format", "--no-renumber",
    "--number-separator", "--starting-line-number", "--number-width",
];

const GREP_FLAGS: &[&str] = &[
    "-E", "-F", "-G", "-P", "-e", "-f", "-i", "-y", "-v", "-w", "-x", "-c", "-L", "-l", "-m",
    "-o", "-q", "-s", "-b", "-H", "-h", "-n", "-T", "-Z", "-z", "-A", "-B", "-C", "-a", "-I",
    "-r", "-R", "-U",
    "--extended-regexp", "--fixed-strings", "--basic-regexp", "--perl-regexp", "--regexp",
    "--file", "--ignore-case", "--no-ignore-case", "--invert-match", "--word-regexp",
    "--line-regexp", "--count", "--color", "--colour", "--files-without-match",
    "--files-with-matches", "--max-count", "--only-matching", "--quiet", "--silent",
    "--no-messages", "--byte-offset", "--with-filename", "--no-filename", "--label",
    "--line-number", "--initial-tab", "--null", "--null-data", "--after-context",
    "--before-context", "--context", "--text", "--binary-files", "--devices",
    "--directories", "--exclude", "--exclude-from", "--exclude-dir", "--include",
    "--recursive", "--dereference-recursive", "--line-buffered", "--binary",
];

const SORT_FLAGS: &[&str] = &[
    "-b", "-d", "-f", "-g", "-i", "-M", "-h", "-n", "-R", "-r", "-V", "-c", "-C", "-k", "-m",
    "-s", "-t", "-u", "-z",
    "--ignore-leading-blanks", "--dictionary-order", "--ignore-case", "--general-numeric-sort",
    "--ignore-nonprinting", "--month-sort", "--human-numeric-sort", "--numeric-sort",
    "--random-sort", "--reverse", "--sort", "--version-sort", "--check", "--key", "--merge",
    "--stable", "--field-separator", "--unique", "--zero-terminated", "--files0-from",
    "--debug",
];

const DIFF_FLAGS: &[&str] = &[
    "-q", "-s", "-c", "-C", "-u", "-U", "-e", "-n", "-y", "-W", "-p", "-F", "-t", "-T", "-r",
    "-N", "-x", "-X", "-S", "-i", "-E", "-Z", "-b", "-w", "-B", "-I", "-a", "-d",
    "--brief", "--report-identical-files", "--context", "--unified", "--ed", "--normal",
    "--rcs", "--side-by-side", "--width", "--left-column", "--suppress-common-lines",
    "--show-c-function", "--show-function-line", "--label", "--expand-tabs",
    "--initial-tab", "--tabsize", "--suppress-blank-empty", "--recursive",
    "--no-dereference", "--new-file", "--unidirectional-new-file", "--ignore-file-name-case",
    "--no-ignore-file-name-case", "--exclude", "--exclude-from", "--starting-file",
    "--from-file", "--to-file", "--ignore-case", "--ignore-tab-expansion",
    "--ignore-trailing-space", "--ignore-space-change", "--ignore-all-space",
    "--ignore-blank-lines", "--ignore-matching-lines", "--text", "--strip-trailing-cr",
    "--minimal", "--speed-large-files", "--color",
];

const CHECKSUM_FLAGS: &[&str] = &[
    "-b", "-t", "-c", "-w", "-z", "-l", "--binary", "--text", "--check", "--tag", "--zero",
    "--ignore-missing", "--quiet", "--status", "--strict", "--warn", "--length",
];

const TAR_FLAGS: &[&str] = &[
    "-t", "-v", "-f", "-z", "-j", "-J", "-a", "-w",
    "--list", "--verbose", "--file", "--gzip", "--gunzip", "--bzip2", "--xz", "--lzma",
    "--zstd", "--auto-compress", "--numeric-owner", "--full-time", "--utc", "--wildcards",
    "--no-wildcards", "--anchored", "--ignore-case", "--exclude", "--occurrence",
    "--quoting-style", "--show-transformed-names", "--block-number",
];

const UNZIP_FLAGS: &[&str] = &[
    "-l", "-v", "-Z", "-t", "-q", "-1", "-2", "-s", "-m", "-h", "-M", "-T", "-z", "-C",
];

const JQ_FLAGS: &[&str] = &[
    "-r", "-j", "-a", "-c", "-s", "-n", "-e", "-S", "-C", "-M", "-R", "-f",
    "--raw-output", "--join-output", "--ascii-output", "--compact-output", "--slurp",
    "--null-input", "--exit-status", "--sort-keys", "--color-output", "--monochrome-output",
    "--raw-input", "--tab", "--indent", "--arg", "--argjson", "--slurpfile", "--rawfile",
    "--args", "--jsonargs", "--from-file", "--seq", "--stream", "--raw-output0",
];

const PS_FLAGS: &[&str] = &[
    "-e", "-A", "-a", "-d", "-N", "-f", "-F", "-l", "-j", "-o", "-O", "-p", "-u", "-U", "-g",
    "-G", "-t", "-C", "-H", "-L", "-T", "-w", "-y", "-M", "-Z", "-q", "-s",
    "--pid", "--ppid", "--user", "--group", "--tty", "--sort", "--format", "--forest",
    "--no-headers", "--headers", "--cols", "--columns", "--width", "--lines", "--rows",
    "--sid", "--quick-pid",
];

const PRINTENV_FLAGS: &[&str] = &["-0", "--null"];

const UNAME_FLAGS: &[&str] = &[
    "-a", "-s", "-n", "-r", "-v", "-m", "-p", "-i", "-o", "--all", "--kernel-name",
    "--nodename", "--kernel-release", "--kernel-version", "--machine", "--processor",
    "--hardware-platform", "--operating-system",
];

const ID_FLAGS: &[&str] = &[
    "-u", "-g", "-G", "-n", "-r", "-z", "-a", "--user", "--group", "--groups", "--name",
    "--real", "--zero",
];

const WHICH_FLAGS: &[&str] = &["-a", "-s"];

const GIT_SUBCOMMANDS: &[&str] = &[
    "status", "log", "show", "diff", "blame", "ls-files", "ls-tree", "rev-parse", "describe",
    "shortlog", "grep", "cat-file", "show-ref", "for-each-ref", "rev-list", "name-rev",
    "merge-base", "count-objects",
];

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const FLAG_TABLES: &[&[&str]] = &[
        LS_FLAGS, TREE_FLAGS, DU_FLAGS, DF_FLAGS, STAT_FLAGS, FILE_FLAGS, REALPATH_FLAGS,
        CAT_FLAGS, HEAD_FLAGS, TAIL_FLAGS, WC_FLAGS, OD_FLAGS, NL_FLAGS, GREP_FLAGS, SORT_FLAGS,
        DIFF_FLAGS, CHECKSUM_FLAGS, TAR_FLAGS, UNZIP_FLAGS, JQ_FLAGS, PS_FLAGS, PRINTENV_FLAGS,
        UNAME_FLAGS, ID_FLAGS, WHICH_FLAGS,
    ];

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn names_are_unique_and_round_trip() {
        let mut seen = HashSet::new();
        for op in Operation::ALL {
            assert!(seen.insert(op.name()), "duplicate name {}", op.name());
            assert_eq!(Operation::from_name(op.name()), Some(*op));
            assert!(!op.description().is_empty());
        }
        assert_eq!(Operation::from_name("rm"), None);
        assert_eq!(Operation::from_name(""), None);
        assert_eq!(Operation::from_name("List-Directory"), None);
    }

    #[test]
    fn names_are_kebab_case() {
        for op in Operation::ALL {
            assert!(
                op.name().chars().all(|c| c.is_ascii_lowercase() || c == '-' || c.is_ascii_digit()),
                "{} is not kebab-case",
                op.name()
            );
        }
    }

    #[test]
    fn allowlists_only_hold_flag_shaped_entries() {
        for table in FLAG_TABLES {
            for flag in *table {
                assert!(crate::policy::is_flag(flag), "{} is not flag-shaped", flag);
            }
        }
    }

    #[test]
    fn mutating_flags_absent_from_allowlists() {
        let mutating = [
            ("sort", SORT_FLAGS, "-o"),
            ("sort", SORT_FLAGS, "--output"),
            ("sort", SORT_FLAGS, "--compress-program"),
            ("sort", SORT_FLAGS, "-T"),
            ("tree", TREE_FLAGS, "-o"),
            ("file", FILE_FLAGS, "-C"),
            ("file", FILE_FLAGS, "--compile"),
            ("tail", TAIL_FLAGS, "-f"),
            ("tail", TAIL_FLAGS, "-F"),
            ("tail", TAIL_FLAGS, "--follow"),
            ("tar", TAR_FLAGS, "-x"),
            ("tar", TAR_FLAGS, "-c"),
            ("tar", TAR_FLAGS, "-r"),
            ("tar", TAR_FLAGS, "-u"),
            ("tar", TAR_FLAGS, "-I"),
            ("tar", TAR_FLAGS, "--to-command"),
            ("tar", TAR_FLAGS, "--use-compress-program"),
            ("tar", TAR_FLAGS, "--checkpoint-action"),
            ("tar", TAR_FLAGS, "--delete"),
            ("unzip", UNZIP_FLAGS, "-o"),
            ("unzip", UNZIP_FLAGS, "-d"),
            ("unzip", UNZIP_FLAGS, "-p"),
            ("diff", DIFF_FLAGS, "-l"),
            ("diff", DIFF_FLAGS, "--paginate"),
        ];
        for (cmd, table, flag) in mutating {
            assert!(!table.contains(&flag), "{} allowlist must not contain {}", cmd, flag);
        }
    }

    #[test]
    fn every_policy_is_deterministic() {
        let probes = [args(&["-l"]), args(&["--definitely-not-a-flag"]), args(&[]), args(&["status"])];
        for op in Operation::ALL {
            for probe in &probes {
                let a = op.policy().resolve(probe);
                let b = op.policy().resolve(probe);
                assert_eq!(a, b, "{} not deterministic for {:?}", op.name(), probe);
            }
        }
    }

    #[test]
    fn find_refuses_exec_and_delete_anywhere() {
        let policy = Operation::SafeFind.policy();
        for bad in ["-exec", "-execdir", "-ok", "-okdir", "-delete", "-fprint", "-fls", "-fprintf"] {
            let v = policy.resolve(&args(&[".", "-name", "*.rs", bad, "rm", "{}", ";"])).unwrap_err();
            assert_eq!(v.token, bad);
            let v = policy.resolve(&args(&[bad, "."])).unwrap_err();
            assert_eq!(v.token, bad);
        }
        assert!(policy.resolve(&args(&[".", "-name", "*.rs", "-type", "f", "-print"])).is_ok());
    }

    #[test]
    fn sed_refuses_in_place_in_every_spelling() {
        let policy = Operation::SearchReplace.policy();
        for bad in ["-i", "--in-place", "--in-place=.bak", "-i.bak", "-ni", "-Ei"] {
            assert!(policy.resolve(&args(&[bad, "s/a/b/", "f"])).is_err(), "{} accepted", bad);
            assert!(policy.resolve(&args(&["s/a/b/", "f", bad])).is_err(), "{} accepted", bad);
        }
        let inv = policy.resolve(&args(&["-n", "s/a/b/p", "f"])).unwrap();
        assert_eq!(inv.args[0], "--sandbox");
    }

    #[test]
    fn sed_refuses_abbreviated_in_place() {
        let policy = Operation::SearchReplace.policy();
        for bad in ["--in", "--in-pl", "--i=.bak", "--inp", "--in-place="] {
            let v = policy.resolve(&args(&[bad, "s/alpha/beta/", "notes.txt"])).unwrap_err();
            assert_eq!(v.token, bad);
            assert!(policy.resolve(&args(&["s/alpha/beta/", "notes.txt", bad])).is_err(), "{} accepted", bad);
        }
        assert!(policy.resolve(&args(&["--expression=s/a/b/", "--quiet", "f"])).is_ok());
        assert!(policy.resolve(&args(&["--", "s/a/b/", "f"])).is_ok());
    }

    #[test]
    fn ripgrep_refuses_preprocessor() {
        let policy = Operation::Ripgrep.policy();
        assert!(policy.resolve(&args(&["--pre", "sh", "x"])).is_err());
        assert!(policy.resolve(&args(&["--pre=sh", "x"])).is_err());
        assert!(policy.resolve(&args(&["--pr=sh", "x"])).is_err());
        assert!(policy.resolve(&args(&["-i", "needle", "."])).is_ok());
    }

    #[test]
    fn yq_refuses_in_place_and_split() {
        let policy = Operation::QueryYaml.policy();
        assert!(policy.resolve(&args(&["-i", ".a = 1", "f.yaml"])).is_err());
        assert!(policy.resolve(&args(&["-Pi", ".a = 1", "f.yaml"])).is_err());
        assert!(policy.resolve(&args(&["--inplace", ".a = 1", "f.yaml"])).is_err());
        assert!(policy.resolve(&args(&["-s", ".name", "f.yaml"])).is_err());
        assert!(policy.resolve(&args(&["-o=json", ".a", "f.yaml"])).is_ok());
    }

    #[test]
    fn git_gate_accepts_read_only_subcommands_only() {
        let policy = Operation::GitQuery.policy();
        for sub in GIT_SUBCOMMANDS {
            assert!(policy.resolve(&args(&[*sub])).is_ok(), "{} refused", sub);
        }
        for bad in ["", "push", "commit", "reset", "checkout", "config", "branch", "tag", "remote",
                    "stash", "-c", "--exec-path", "clean", "gc", "reflog", "STATUS"] {
            let v = policy.resolve(&args(&[bad])).unwrap_err();
            assert_eq!(v.token, bad);
        }
        assert!(policy.resolve(&args(&[])).is_err());
        assert!(policy.resolve(&args(&["diff", "--output=/tmp/x"])).is_err());
        assert!(policy.resolve(&args(&["grep", "-O", "needle"])).is_err());
        assert!(policy.resolve(&args(&["grep", "-iO", "needle"])).is_err());
        assert!(policy.resolve(&args(&["diff", "--output-indicator-new=+"])).is_ok());
    }

    #[test]
    fn git_refuses_abbreviated_pager_and_output() {
        let policy = Operation::GitQuery.policy();
        for argv in [
            &["grep", "--open-files=sh", "x"][..],
            &["grep", "--open=sh", "x"],
            &["grep", "--open-files-in", "x"],
            &["diff", "--ext"],
            &["diff", "--out=/tmp/x"],
        ] {
            let v = policy.resolve(&args(argv)).unwrap_err();
            assert_eq!(v.token, argv[1]);
        }
        assert!(policy.resolve(&args(&["log", "--oneline", "--no-ext-diff"])).is_ok());
    }

    #[test]
    fn git_invocation_is_hardened_and_uncoloured() {
        let inv = Operation::GitQuery.policy().resolve(&args(&["log", "--color=always", "-3"])).unwrap();
        assert_eq!(inv.program, "git");
        assert_eq!(inv.args, args(&["--no-pager", "-c", "core.fsmonitor=false", "log", "-3"]));
        assert!(inv.env.contains(&("GIT_OPTIONAL_LOCKS".to_string(), "0".to_string())));
        assert!(inv.env.contains(&("GIT_TEST_DISALLOW_ABBREVIATED_OPTIONS".to_string(), "1".to_string())));
    }

    #[test]
    fn tar_never_treats_archives_as_remote() {
        let policy = Operation::ListArchive.policy();
        let inv = policy.resolve(&args(&["-tf", "-oProxyCommand=sh evil.sh:x"])).unwrap();
        assert_eq!(inv.program, "tar");
        assert_eq!(inv.args[0], "--force-local");
        let inv = policy.resolve(&args(&["--list", "--file=host:backup.tar"])).unwrap();
        assert_eq!(inv.args, args(&["--force-local", "--list", "--file=host:backup.tar"]));
    }

    #[test]
    fn tar_requires_listing_flag() {
        let policy = Operation::ListArchive.policy();
        assert!(policy.resolve(&args(&["-tvf", "a.tar"])).is_ok());
        assert!(policy.resolve(&args(&["-tzf", "a.tar.gz"])).is_ok());
        assert!(policy.resolve(&args(&["--list", "--file", "a.tar"])).is_ok());
        // permitted flags but no listing mode
        assert!(policy.resolve(&args(&["-vf", "a.tar"])).is_err());
        assert!(policy.resolve(&args(&["-z", "-f", "a.tar"])).is_err());
        assert!(policy.resolve(&args(&["-xf", "a.tar"])).is_err());
        assert!(policy.resolve(&args(&["xf", "a.tar"])).is_err());
        assert!(policy.resolve(&args(&["-tf", "a.tar", "--to-command=sh"])).is_err());
        assert!(policy.resolve(&args(&[])).is_err());
    }

    #[test]
    fn unzip_requires_leading_listing_flag() {
        let policy = Operation::ListZip.policy();
        assert!(policy.resolve(&args(&["-l", "a.zip"])).is_ok());
        assert!(policy.resolve(&args(&["-Z", "-1", "a.zip"])).is_ok());
        assert!(policy.resolve(&args(&["-q", "a.zip"])).is_err());
        assert!(policy.resolve(&args(&["a.zip"])).is_err());
        assert!(policy.resolve(&args(&["-l", "-o", "a.zip"])).is_err());
    }

    #[test]
    fn checksum_selects_binary_by_first_argument() {
        let policy = Operation::Checksum.policy();
        let inv = policy.resolve(&args(&["sha512", "--tag", "f"])).unwrap();
        assert_eq!(inv.program, "sha512sum");
        assert_eq!(inv.args, args(&["--tag", "f"]));
        assert_eq!(policy.resolve(&args(&["b2", "f"])).unwrap().program, "b2sum");
        assert!(policy.resolve(&args(&["crc32", "f"])).is_err());
        assert!(policy.resolve(&args(&["-c", "f"])).is_err());
        assert!(policy.resolve(&args(&[])).is_err());
    }

    #[test]
    fn list_directory_drops_colour() {
        let inv = Operation::ListDirectory.policy().resolve(&args(&["-la", "--color=always", "/"])).unwrap();
        assert_eq!(inv.args, args(&["-la", "/"]));
    }
}
