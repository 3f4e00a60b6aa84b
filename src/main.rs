use anyhow::Result;
use bitstore::areas::repository::Repository;
use bitstore::artifacts::core::config::Config;
use bitstore::artifacts::objects::object_type::ObjectType;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "bitstore",
    version = "0.1.0",
    author = "Sami Barbut-Dica",
    about = "A content-addressed object store with a git-compatible layout",
    long_about = "Stores blobs, trees, commits and tags in a .git directory, \
    stages files through the index and resolves names through references.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
"
)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "init",
        about = "Initialize a new repository",
        long_about = "This command initializes a new repository in the current directory or at the specified path."
    )]
    Init {
        #[arg(index = 1, help = "The path to the repository")]
        path: Option<PathBuf>,
    },
    #[command(
        name = "add",
        about = "Add file contents to the index",
        long_about = "This command stages files, expanding directories and skipping ignored files found inside them."
    )]
    Add {
        #[arg(index = 1, required = true, help = "The files or directories to stage")]
        paths: Vec<String>,
    },
    #[command(name = "rm", about = "Remove files from the index and the working tree")]
    Rm {
        #[arg(long, help = "Only remove the files from the index")]
        cached: bool,
        #[arg(index = 1, required = true, help = "The files to remove")]
        paths: Vec<String>,
    },
    #[command(
        name = "commit",
        about = "Create a new commit with the specified message",
        long_about = "This command records the staged tree as a new commit and moves HEAD to it."
    )]
    Commit {
        #[arg(short, long, help = "The commit message")]
        message: String,
    },
    #[command(
        name = "checkout",
        about = "Write the tree of a commit into an empty directory"
    )]
    Checkout {
        #[arg(index = 1, help = "The commit, tag or tree to check out")]
        name: String,
        #[arg(index = 2, help = "An empty or missing directory")]
        path: PathBuf,
    },
    #[command(
        name = "cat-file",
        about = "Print the content of an object",
        long_about = "This command prints the raw payload of an object, dereferencing tags and commits to the requested type."
    )]
    CatFile {
        #[arg(index = 1, help = "The object type: blob, tree, commit or tag")]
        object_type: ObjectType,
        #[arg(index = 2, help = "The object to print")]
        name: String,
    },
    #[command(
        name = "hash-object",
        about = "Hash an object and optionally write it to the object database",
        long_about = "This command hashes a file as an object of the given type and can write it to the object database."
    )]
    HashObject {
        #[arg(short, long, required = false, help = "Write the object to the object database")]
        write: bool,
        #[arg(short = 't', long = "type", default_value = "blob", help = "The object type")]
        object_type: ObjectType,
        #[arg(index = 1)]
        file: PathBuf,
    },
    #[command(name = "ls-tree", about = "List the contents of a tree object")]
    LsTree {
        #[arg(short, help = "Recurse into subtrees")]
        recursive: bool,
        #[arg(index = 1, help = "The tree-ish to list")]
        name: String,
    },
    #[command(name = "ls-files", about = "List the staged files")]
    LsFiles {
        #[arg(short, long, help = "Show every field of each entry")]
        verbose: bool,
    },
    #[command(name = "rev-parse", about = "Resolve a name to an object ID")]
    RevParse {
        #[arg(long = "type", help = "Dereference the object to this type")]
        object_type: Option<ObjectType>,
        #[arg(index = 1)]
        name: String,
    },
    #[command(name = "show-ref", about = "List references")]
    ShowRef {
        #[arg(long, help = "Only print reference names")]
        no_hash: bool,
    },
    #[command(name = "check-ignore", about = "Check paths against the ignore rules")]
    CheckIgnore {
        #[arg(short, long, help = "Print the matching pattern")]
        verbose: bool,
        #[arg(index = 1, required = true)]
        paths: Vec<String>,
    },
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn discover(pwd: &Path) -> Result<Repository> {
    Repository::discover(pwd, Box::new(std::io::stdout()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = Config::from_env();
    let pwd = std::env::current_dir()?;

    match &cli.command {
        Commands::Init { path } => {
            let path = path.clone().unwrap_or_else(|| pwd.clone());
            Repository::new(&path, Box::new(std::io::stdout()))?.init()?
        }
        Commands::Add { paths } => discover(&pwd)?.add(&config, paths)?,
        Commands::Rm { cached, paths } => discover(&pwd)?.rm(paths, *cached)?,
        Commands::Commit { message } => discover(&pwd)?.commit(&config, message)?,
        Commands::Checkout { name, path } => discover(&pwd)?.checkout(name, path)?,
        Commands::CatFile { object_type, name } => {
            discover(&pwd)?.cat_file(*object_type, name)?
        }
        Commands::HashObject {
            write,
            object_type,
            file,
        } => {
            let repository = if *write {
                discover(&pwd)?
            } else {
                Repository::new(&pwd, Box::new(std::io::stdout()))?
            };

            repository.hash_object(file, *object_type, *write)?
        }
        Commands::LsTree { recursive, name } => discover(&pwd)?.ls_tree(name, *recursive)?,
        Commands::LsFiles { verbose } => discover(&pwd)?.ls_files(*verbose)?,
        Commands::RevParse { object_type, name } => {
            discover(&pwd)?.rev_parse(name, *object_type)?
        }
        Commands::ShowRef { no_hash } => discover(&pwd)?.show_ref(!*no_hash)?,
        Commands::CheckIgnore { verbose, paths } => {
            discover(&pwd)?.check_ignore(&config, paths, *verbose)?
        }
    }

    Ok(())
}
