mod cli;

use adflocal::documents::AdfDocuments;
use adflocal::environment::Environment;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("ADFL_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Evaluate(evaluate_cli) => evaluate(evaluate_cli),
        cli::Command::Materialize(materialize_cli) => materialize(materialize_cli),
        cli::Command::Activity(activity_cli) => activity(activity_cli),
        cli::Command::Dev(dev_cli) => dev(dev_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn evaluate(cli: cli::EvaluateCommand) -> anyhow::Result<()> {
    let context = cli.window.window().date_context();
    let value = adflocal::expression::evaluate(&cli.expression, &context)?;

    output(&cli.output, &value)
}

pub fn materialize(cli: cli::MaterializeCommand) -> anyhow::Result<()> {
    let documents = load(&cli.input)?;
    let environment = Environment::new(&documents, cli.input.config.as_deref())?;

    let name = match cli.object {
        Some(name) => name,
        None => {
            let mut objects = documents.objects();
            match (objects.next(), objects.next()) {
                (Some((_, _, _, document)), None) => {
                    adflocal::overlay::object_name(document)?.to_string()
                }
                _ => anyhow::bail!("Object name required unless exactly one object is loaded"),
            }
        }
    };

    let value = environment.materialize(&name, &cli.window.window())?;
    output(&cli.output, &value)
}

pub fn activity(cli: cli::ActivityCommand) -> anyhow::Result<()> {
    let documents = load(&cli.input)?;
    let environment = Environment::new(&documents, cli.input.config.as_deref())?;

    let bundle = environment.activity(&cli.pipeline, &cli.activity, &cli.window.window())?;
    output(&cli.output, &bundle)
}

fn load(input: &cli::InputArgs) -> anyhow::Result<AdfDocuments> {
    let mut documents = AdfDocuments::default();

    if !input.workdir && input.files.is_empty() && input.directories.is_empty() {
        let stdin = std::io::read_to_string(std::io::stdin())?;
        documents.insert(serde_json::from_str(&stdin)?, None)?;
        return Ok(documents);
    }

    if input.workdir {
        documents.load_directory(&std::env::current_dir()?)?;
    }

    for file_path in &input.files {
        documents.load_file(file_path)?;
    }

    for dir_path in &input.directories {
        documents.load_directory(dir_path)?;
    }

    anyhow::ensure!(documents.source_count() > 0, "No files loaded");

    Ok(documents)
}

fn output(output: &cli::OutputArgs, value: &impl serde::Serialize) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), value)?,
        cli::OutputFormat::Json => {
            serde_json::to_writer_pretty(std::io::stdout(), value)?;
            println!();
        }
    };

    Ok(())
}

/// (adflocal-)developer utilities
///
/// A quick way to expose internal structures for debugging purposes
pub fn dev(cli: cli::DevCommand) -> anyhow::Result<()> {
    use cli::DevSubCommand::*;

    let documents = load(&cli.input)?;

    match cli.command {
        Documents => println!("{documents:#?}"),
        Resolved => {
            let environment = Environment::new(&documents, cli.input.config.as_deref())?;
            println!("{environment:#?}")
        }
    }

    Ok(())
}
