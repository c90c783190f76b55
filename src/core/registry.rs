//! # Option Group Registry
//!
//! Static, declarative tables for every reusable flag group and every
//! subcommand. Nothing here performs I/O: defaults that depend on persisted
//! state are declared as [`DefaultValue::Resource`] and only looked up when a
//! schema is built.

use crate::core::schema::SchemaError;
use crate::models::{Arity, DefaultValue, Flag, OptionGroup, ResourceKey, SubcommandDef};

// --- Flag helpers ---

const fn resource(key: ResourceKey, required: bool) -> DefaultValue {
    DefaultValue::Resource { key, required }
}

const fn workflow_flag(default: &'static str) -> Flag {
    Flag {
        short: Some('w'),
        default: DefaultValue::Value(default),
        ..Flag::new("workflow", "workflow", "Main workflow to run")
    }
}

// --- Group: base ---

static BASE_FLAGS: &[Flag] = &[
    Flag {
        short: Some('t'),
        aliases: &["max_threads"],
        default: DefaultValue::Value("8"),
        ..Flag::new(
            "max_threads",
            "max-threads",
            "Maximum number of threads given to any particular process",
        )
    },
    Flag {
        short: Some('p'),
        aliases: &["pplacer_threads"],
        default: DefaultValue::Value("8"),
        hidden: true,
        ..Flag::new("pplacer_threads", "pplacer-threads", "Threads given to pplacer")
    },
    Flag {
        short: Some('n'),
        aliases: &["n_cores"],
        default: DefaultValue::Value("16"),
        ..Flag::new(
            "n_cores",
            "n-cores",
            "Maximum number of cores available for use. Must be >= to max_threads",
        )
    },
    Flag {
        short: Some('m'),
        aliases: &["max_memory"],
        default: DefaultValue::Value("250"),
        ..Flag::new(
            "max_memory",
            "max-memory",
            "Maximum memory for available usage in Gigabytes",
        )
    },
    Flag {
        short: Some('o'),
        default: DefaultValue::Value("./"),
        ..Flag::new("output", "output", "Output directory")
    },
    Flag {
        aliases: &["conda_prefix"],
        default: resource(ResourceKey::CondaEnvRoot, true),
        ..Flag::new(
            "conda_prefix",
            "conda-prefix",
            "Path to the location of installed conda environments, or where to install new environments",
        )
    },
    Flag {
        aliases: &["dry_run", "dryrun"],
        arity: Arity::Toggle,
        default: DefaultValue::Value("false"),
        ..Flag::new(
            "dryrun",
            "dry-run",
            "Perform snakemake dry run, tests workflow order and conda environments",
        )
    },
    Flag {
        aliases: &["conda_frontend"],
        default: DefaultValue::Value("mamba"),
        choices: &["conda", "mamba"],
        ..Flag::new(
            "conda_frontend",
            "conda-frontend",
            "Which conda frontend to use, mamba is faster but harder to debug.\n\
             Switch this to conda if experiencing problems installing environments",
        )
    },
    Flag {
        arity: Arity::Toggle,
        default: DefaultValue::Value("true"),
        ..Flag::new(
            "clean",
            "clean",
            "Clean up all temporary files. This will remove most BAM files and any FASTQ files\n\
             generated from read filtering. Setting this to False is the equivalent of the --notemp\n\
             option in snakemake. Useful for when running only part of a workflow as it avoids\n\
             deleting files that would likely be needed in later parts of the workflow.\n\
             NOTE: Not cleaning makes reruns faster but will incur the wrath of your sysadmin",
        )
    },
    Flag {
        arity: Arity::Toggle,
        ..Flag::new(
            "build",
            "build",
            "Build conda environments and then exits. Equivalent to \"--snakemake-cmds '--conda-create-envs-only True'\"",
        )
    },
    Flag {
        aliases: &["snakemake_cmds"],
        default: DefaultValue::Value(""),
        ..Flag::new(
            "cmds",
            "snakemake-cmds",
            "Additional commands to supplied to snakemake in the form of a single string\n\
             e.g. \"--print-compilation True\".\n\
             NOTE: Most commands in snakemake -h are valid but some commands may clash with commands\n\
             aviary directly supplies to snakemake. Please make sure your additional commands don't clash.",
        )
    },
];

// --- Group: qc ---

static QC_FLAGS: &[Flag] = &[
    Flag {
        short: Some('g'),
        aliases: &["gold_standard_assembly"],
        default: DefaultValue::Value("none"),
        ..Flag::new(
            "gold_standard",
            "gold-standard-assembly",
            "Gold standard assembly to compare either the Aviary assembly or a given input assembly against",
        )
    },
    Flag {
        short: Some('r'),
        aliases: &["reference_filter"],
        arity: Arity::Fixed(1),
        default: DefaultValue::Value("none"),
        ..Flag::new(
            "reference_filter",
            "reference-filter",
            "Reference filter file to aid in the assembly",
        )
    },
    Flag {
        aliases: &["min_read_size"],
        default: DefaultValue::Value("1000"),
        ..Flag::new(
            "min_read_size",
            "min-read-size",
            "Minimum long read size when filtering using Filtlong",
        )
    },
    Flag {
        aliases: &["min_mean_q"],
        default: DefaultValue::Value("80"),
        ..Flag::new("min_mean_q", "min-mean-q", "Minimum mean quality threshold")
    },
    Flag {
        aliases: &["keep_percent"],
        default: DefaultValue::Value("100"),
        ..Flag::new(
            "keep_percent",
            "keep-percent",
            "Percentage of reads passing quality thresholds kept by filtlong",
        )
    },
];

// --- Group: short_reads ---

static SHORT_READ_FLAGS: &[Flag] = &[
    Flag {
        short: Some('1'),
        aliases: &["paired-reads-1", "paired_reads_1", "pe1"],
        arity: Arity::List,
        default: DefaultValue::Value("none"),
        ..Flag::new(
            "pe1",
            "pe-1",
            "A space separated list of forwards read files to use for the binning process.\n\
             NOTE: If performing assembly and multiple files are provided then only\n\
             the first file will be used for assembly.",
        )
    },
    Flag {
        short: Some('2'),
        aliases: &["paired-reads-2", "paired_reads_2", "pe2"],
        arity: Arity::List,
        default: DefaultValue::Value("none"),
        ..Flag::new(
            "pe2",
            "pe-2",
            "A space separated list of reverse read files to use for the binning process.\n\
             NOTE: If performing assembly and multiple files are provided then only\n\
             the first file will be used for assembly.",
        )
    },
    Flag {
        short: Some('i'),
        arity: Arity::List,
        default: DefaultValue::Value("none"),
        ..Flag::new(
            "interleaved",
            "interleaved",
            "A space separated list of interleaved read files for the binning process.\n\
             NOTE: If performing assembly and multiple files are provided then only\n\
             the first file will be used for assembly.",
        )
    },
    Flag {
        short: Some('c'),
        arity: Arity::List,
        default: DefaultValue::Value("none"),
        ..Flag::new(
            "coupled",
            "coupled",
            "Forward and reverse read files in a coupled space separated list.\n\
             NOTE: If performing assembly and multiple files are provided then only\n\
             the first two files will be used for assembly.",
        )
    },
];

// --- Group: long_reads ---

static LONG_READ_FLAGS: &[Flag] = &[
    Flag {
        short: Some('l'),
        aliases: &["long-reads", "long_reads"],
        arity: Arity::List,
        default: DefaultValue::Value("none"),
        ..Flag::new(
            "longreads",
            "longreads",
            "A space separated list of long read files for the binning process.\n\
             NOTE: If performing assembly and multiple long read files are provided,\n\
             then only the first file is used for assembly.",
        )
    },
    Flag {
        short: Some('z'),
        aliases: &["longread_type", "long_read_type", "long-read-type"],
        default: DefaultValue::Value("ont"),
        choices: &["ont", "ont_hq", "rs", "sq", "ccs"],
        ..Flag::new(
            "longread_type",
            "longread-type",
            "The sequencing platform and technology for the longreads.\n\
             \"rs\" for PacBio RSII, \"sq\" for PacBio Sequel, \"ccs\" for PacBio CCS reads,\n\
             \"ont\" for Oxford Nanopore and \"ont_hq\" for Oxford Nanopore high quality reads (Guppy5+ or Q20)",
        )
    },
];

// --- Group: annotation ---

static ANNOTATION_FLAGS: &[Flag] = &[
    Flag {
        aliases: &["enrichm_db_path"],
        default: resource(ResourceKey::Enrichm, false),
        ..Flag::new(
            "enrichm_db_path",
            "enrichm-db-path",
            "Path to the local EnrichM Database files",
        )
    },
    Flag {
        aliases: &["gtdb_path"],
        default: resource(ResourceKey::Gtdb, true),
        ..Flag::new("gtdb_path", "gtdb-path", "Path to the local gtdb database files")
    },
    Flag {
        aliases: &["eggnog_db_path"],
        default: resource(ResourceKey::Eggnog, true),
        ..Flag::new(
            "eggnog_db_path",
            "eggnog-db-path",
            "Path to the local eggnog database files",
        )
    },
];

// --- Group: binning ---

static BINNING_FLAGS: &[Flag] = &[
    Flag {
        short: Some('s'),
        aliases: &["min_contig_size"],
        default: DefaultValue::Value("1500"),
        ..Flag::new(
            "min_contig_size",
            "min-contig-size",
            "Minimum contig size in base pairs to be considered for binning",
        )
    },
    Flag {
        short: Some('b'),
        aliases: &["min_bin_size"],
        default: DefaultValue::Value("200000"),
        ..Flag::new(
            "min_bin_size",
            "min-bin-size",
            "Minimum bin size in base pairs for a MAG",
        )
    },
];

// --- Group: mag ---

static MAG_FLAGS: &[Flag] = &[
    Flag {
        short: Some('f'),
        aliases: &["genome_fasta_files"],
        arity: Arity::List,
        ..Flag::new("mags", "genome-fasta-files", "MAGs to be annotated")
    },
    Flag {
        short: Some('d'),
        aliases: &["genome_fasta_directory"],
        ..Flag::new(
            "directory",
            "genome-fasta-directory",
            "Directory containing MAGs to be annotated",
        )
    },
    Flag {
        short: Some('x'),
        aliases: &["fasta_extension"],
        default: DefaultValue::Value("fna"),
        ..Flag::new(
            "ext",
            "fasta-extension",
            "File extension of fasta files in --genome-fasta-directory",
        )
    },
];

// --- Group: isolate ---

static ISOLATE_FLAGS: &[Flag] = &[
    Flag {
        aliases: &["guppy_model"],
        arity: Arity::Fixed(1),
        default: DefaultValue::Value("r941_min_high_g360"),
        ..Flag::new(
            "guppy_model",
            "guppy-model",
            "The guppy model used by medaka to perform polishing",
        )
    },
    Flag {
        aliases: &["genome_size"],
        arity: Arity::Fixed(1),
        default: DefaultValue::Value("5000000"),
        ..Flag::new(
            "genome_size",
            "genome-size",
            "Approximate size of the isolate genome to be assembled",
        )
    },
];

// --- Group: cluster ---

static CLUSTER_FLAGS: &[Flag] = &[
    Flag {
        aliases: &["previous_runs"],
        arity: Arity::List,
        required: true,
        ..Flag::new(
            "previous_runs",
            "previous-runs",
            "The paths to the previous finished runs of Aviary.\n\
             Must contain the bins/checkm.out and bins/final_bins outputs",
        )
    },
    Flag {
        default: DefaultValue::Value("0.97"),
        ..Flag::new("ani", "ani", "Overall ANI level to dereplicate at with Galah.")
    },
    Flag {
        aliases: &["precluster_ani"],
        default: DefaultValue::Value("0.95"),
        ..Flag::new(
            "precluster_ani",
            "precluster-ani",
            "Require at least this dashing-derived ANI for preclustering and to avoid FastANI\n\
             on distant lineages within preclusters.",
        )
    },
    Flag {
        aliases: &["precluster_method"],
        default: DefaultValue::Value("dashing"),
        ..Flag::new(
            "precluster_method",
            "precluster-method",
            "Method of calculating rough ANI for dereplication.\n\
             'dashing' for HyperLogLog, 'finch' for finch MinHash.",
        )
    },
    Flag {
        aliases: &["min_completeness"],
        default: DefaultValue::Value("70"),
        ..Flag::new(
            "min_completeness",
            "min-completeness",
            "Ignore genomes with less completeness than this percentage.",
        )
    },
    Flag {
        aliases: &["max_contamination"],
        default: DefaultValue::Value("10"),
        ..Flag::new(
            "max_contamination",
            "max-contamination",
            "Ignore genomes with more contamination than this percentage.",
        )
    },
];

/// Every registered group. The `name` is the lookup key for [`group`].
static GROUPS: &[OptionGroup] = &[
    OptionGroup {
        name: "base",
        flags: BASE_FLAGS,
        exclusive: &[],
    },
    OptionGroup {
        name: "qc",
        flags: QC_FLAGS,
        exclusive: &[],
    },
    OptionGroup {
        name: "short_reads",
        flags: SHORT_READ_FLAGS,
        exclusive: &[&["pe1", "interleaved", "coupled"]],
    },
    OptionGroup {
        name: "long_reads",
        flags: LONG_READ_FLAGS,
        exclusive: &[],
    },
    OptionGroup {
        name: "annotation",
        flags: ANNOTATION_FLAGS,
        exclusive: &[],
    },
    OptionGroup {
        name: "binning",
        flags: BINNING_FLAGS,
        exclusive: &[],
    },
    OptionGroup {
        name: "mag",
        flags: MAG_FLAGS,
        exclusive: &[&["mags", "directory"]],
    },
    OptionGroup {
        name: "isolate",
        flags: ISOLATE_FLAGS,
        exclusive: &[],
    },
    OptionGroup {
        name: "cluster",
        flags: CLUSTER_FLAGS,
        exclusive: &[],
    },
];

/// Looks up a registered group by name.
pub fn group(name: &str) -> Result<&'static OptionGroup, SchemaError> {
    GROUPS
        .iter()
        .find(|g| g.name == name)
        .ok_or_else(|| SchemaError::UnknownGroup(name.to_string()))
}

/// All registered groups, in registration order.
pub fn groups() -> &'static [OptionGroup] {
    GROUPS
}

// --- Subcommands ---

static RECOVER_EXTRA: &[Flag] = &[
    Flag {
        short: Some('a'),
        arity: Arity::Fixed(1),
        ..Flag::new(
            "assembly",
            "assembly",
            "FASTA file containing scaffolded contigs of the metagenome assembly",
        )
    },
    workflow_flag("recover_mags"),
    Flag {
        aliases: &["checkm2_db_path"],
        default: resource(ResourceKey::Checkm2, false),
        hidden: true,
        ..Flag::new("checkm2_db_path", "checkm2-db-path", "Path to the local CheckM2 database")
    },
];

static CONFIGURE_FLAGS: &[Flag] = &[
    Flag {
        aliases: &["conda_prefix"],
        ..Flag::new(
            "conda_prefix",
            "conda-prefix",
            "Path to the location of installed conda environments, or where to install new environments",
        )
    },
    Flag {
        aliases: &["gtdb_path"],
        ..Flag::new("gtdb_path", "gtdb-path", "Path to the local gtdb database files")
    },
    Flag {
        aliases: &["busco_db_path"],
        ..Flag::new(
            "busco_db_path",
            "busco-db-path",
            "Path to the local BUSCO database files",
        )
    },
    Flag {
        aliases: &["checkm2_db_path"],
        hidden: true,
        ..Flag::new("checkm2_db_path", "checkm2-db-path", "Path to the local CheckM2 database")
    },
    Flag {
        aliases: &["eggnog_db_path"],
        ..Flag::new(
            "eggnog_db_path",
            "eggnog-db-path",
            "Path to the local eggnog database files",
        )
    },
    Flag {
        aliases: &["enrichm_db_path"],
        ..Flag::new(
            "enrichm_db_path",
            "enrichm-db-path",
            "Path to the local EnrichM database files",
        )
    },
];

/// The name of the subcommand that persists paths instead of running a workflow.
pub const CONFIGURE: &str = "configure";

static SUBCOMMANDS: &[SubcommandDef] = &[
    SubcommandDef {
        name: "assemble",
        about: "Step-down hybrid assembly using long and short reads, or assembly using only short or long reads.",
        epilog: "                                        ......:::::: ASSEMBLE ::::::......\n\n\
                 aviary assemble -1 *.1.fq.gz -2 *.2.fq.gz --longreads *.nanopore.fastq.gz --long_read_type ont\n",
        groups: &["qc", "short_reads", "long_reads", "binning", "base"],
        extra: &[workflow_flag("complete_assembly")],
    },
    SubcommandDef {
        name: "recover",
        about: "Recover MAGs from provided assembly using a variety of binning algorithms",
        epilog: "                                        ......:::::: RECOVER ::::::......\n\n\
                 aviary recover --assembly scaffolds.fasta -1 *.1.fq.gz -2 *.2.fq.gz --longreads *.nanopore.fastq.gz --long_read_type ont\n",
        groups: &["qc", "short_reads", "long_reads", "binning", "base"],
        extra: RECOVER_EXTRA,
    },
    SubcommandDef {
        name: "annotate",
        about: "Annotate MAGs",
        epilog: "                                        ......:::::: ANNOTATE ::::::......\n\n\
                 aviary annotate --genome-fasta-files *.fasta\n",
        groups: &["mag", "annotation", "base"],
        extra: &[workflow_flag("complete_annotation")],
    },
    SubcommandDef {
        name: "genotype",
        about: "Perform strain level analysis of MAGs",
        epilog: "                                        ......:::::: GENOTYPE ::::::......\n\n\
                 aviary genotype --genome-fasta-files *.fasta\n",
        groups: &["mag", "short_reads", "long_reads", "base"],
        extra: &[workflow_flag("create_webpage_genotype")],
    },
    SubcommandDef {
        name: "cluster",
        about: "Clusters previous aviary runs together and performs dereplication using Galah",
        epilog: "                                        ......:::::: CLUSTER ::::::......\n\n\
                 aviary cluster --previous-runs aviary_output_folder_1/ aviary_output_folder_2/\n",
        groups: &["base", "cluster"],
        extra: &[workflow_flag("complete_cluster")],
    },
    SubcommandDef {
        name: "viral",
        about: "Recover and annotate viral genomes",
        epilog: "                                        ......:::::: VIRAL ::::::......\n\n\
                 aviary viral --genome-fasta-files *.fasta\n",
        groups: &["mag", "short_reads", "long_reads", "base"],
        extra: &[workflow_flag("create_webpage_genotype")],
    },
    SubcommandDef {
        name: "complete",
        about: "Runs each stage of the pipeline: assemble, recover, annotate, genotype in that order.",
        epilog: "                                        ......:::::: COMPLETE ::::::......\n\n\
                 aviary complete -1 *.1.fq.gz -2 *.2.fq.gz --longreads *.nanopore.fastq.gz\n",
        groups: &["short_reads", "long_reads", "binning", "annotation", "base"],
        extra: &[workflow_flag("complete_workflow")],
    },
    SubcommandDef {
        name: "isolate",
        about: "Perform isolate assembly",
        epilog: "                                        ......:::::: ISOLATE ::::::......\n\n\
                 aviary isolate -1 *.1.fq.gz -2 *.2.fq.gz --longreads *.nanopore.fastq.gz --long_read_type ont\n",
        groups: &["qc", "short_reads", "long_reads", "isolate", "binning", "base"],
        extra: &[workflow_flag("create_webpage_assemble")],
    },
    SubcommandDef {
        name: CONFIGURE,
        about: "Sets the conda environment variables for future runs.",
        epilog: "                                        ......:::::: CONFIGURE ::::::......\n\n\
                 aviary configure --conda-prefix ~/.conda --gtdb-path ~/gtdbtk/release202/\n",
        groups: &[],
        extra: CONFIGURE_FLAGS,
    },
];

/// Finds a subcommand definition by name.
pub fn subcommand(name: &str) -> Option<&'static SubcommandDef> {
    SUBCOMMANDS.iter().find(|def| def.name == name)
}

/// All registered subcommands, in the order they appear in help output.
pub fn subcommands() -> &'static [SubcommandDef] {
    SUBCOMMANDS
}

/// Which resource a `configure` flag id persists.
pub fn configure_target(flag_id: &str) -> Option<ResourceKey> {
    match flag_id {
        "conda_prefix" => Some(ResourceKey::CondaEnvRoot),
        "gtdb_path" => Some(ResourceKey::Gtdb),
        "busco_db_path" => Some(ResourceKey::Busco),
        "checkm2_db_path" => Some(ResourceKey::Checkm2),
        "eggnog_db_path" => Some(ResourceKey::Eggnog),
        "enrichm_db_path" => Some(ResourceKey::Enrichm),
        _ => None,
    }
}
