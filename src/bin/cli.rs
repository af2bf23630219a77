//! CLI for submissions and cluster administration

use clap::{Parser, Subcommand};
use minijudge::common::NodeId;
use minijudge::coordinator::client::RpcClient;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "minijudge")]
#[command(about = "minijudge cluster CLI")]
#[command(version)]
struct Cli {
    /// Coordinator URL
    #[arg(long, default_value = "http://127.0.0.1:9000")]
    coordinator: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show leader, node liveness, load and clocks
    Status,

    /// Show running tasks and recent results
    Metrics,

    /// List the problem catalog
    Problems,

    /// Submit code for execution
    Submit {
        /// Source file
        #[arg(long)]
        file: PathBuf,

        /// Test snippet file
        #[arg(long)]
        tests: Option<PathBuf>,
    },

    /// Mark a node as crashed
    Crash { node_id: NodeId },

    /// Bring a crashed node back
    Recover { node_id: NodeId },

    /// Force a new leader election
    Elect,

    /// Submit a batch of trivial tasks
    Batch {
        #[arg(default_value = "5")]
        count: i64,
    },

    /// Replicate a key from the leader to every node
    Replicate { key: String, value: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let client = RpcClient::new(cli.coordinator);

    match cli.command {
        Commands::Status => {
            let status = client.get_cluster_status().await?;
            match status.leader {
                Some(leader) => println!("Leader: node {} (term {})", leader, status.term),
                None => println!("Leader: none (term {})", status.term),
            }
            for (id, node) in &status.nodes {
                println!(
                    "  node {:>3}  {:<5}  load={:<3} clock={:<6} port={}",
                    id,
                    if node.alive { "alive" } else { "dead" },
                    node.load,
                    node.clock,
                    node.port
                );
            }
        }

        Commands::Metrics => {
            let metrics = client.get_runtime_metrics().await?;
            println!("Running:");
            for (node, tasks) in &metrics.running {
                for (task, view) in tasks {
                    println!(
                        "  node {} task {} on {}",
                        node,
                        task,
                        view.thread.as_deref().unwrap_or("queued")
                    );
                }
            }
            println!("Recent:");
            for record in &metrics.recent {
                println!(
                    "  #{:<4} node {}  {:<7} {:.3}s  {}",
                    record.task_id,
                    record.node_id,
                    record.status,
                    record.duration,
                    record.output.trim_end()
                );
            }
        }

        Commands::Problems => {
            for (key, problem) in client.list_problems().await? {
                println!("{}: {}", key, problem.title);
                println!("  {}", problem.prompt);
            }
        }

        Commands::Submit { file, tests } => {
            let code = tokio::fs::read_to_string(&file).await?;
            let tests = match tests {
                Some(path) => tokio::fs::read_to_string(path).await?,
                None => String::new(),
            };
            println!("{}", client.submit_code(&code, &tests).await?);
        }

        Commands::Crash { node_id } => {
            if client.crash_node(node_id).await? {
                println!("Node {} crashed", node_id);
            } else {
                println!("Unknown node {}", node_id);
            }
        }

        Commands::Recover { node_id } => {
            if client.recover_node(node_id).await? {
                println!("Node {} recovered", node_id);
            } else {
                println!("Unknown node {}", node_id);
            }
        }

        Commands::Elect => match client.force_election().await? {
            Some(leader) => println!("New leader: node {}", leader),
            None => println!("No alive node"),
        },

        Commands::Batch { count } => {
            let result = client.submit_batch(count).await?;
            println!("Submitted: {}", result.submitted);
            for output in &result.outputs {
                println!("  {}", output.trim_end());
            }
        }

        Commands::Replicate { key, value } => {
            let leader = client.replicate_problem(&key, &value).await?;
            println!("Replicated {} from leader {}", key, leader);
            for (node, entry) in client.replicas(&key).await? {
                match entry {
                    Some(entry) => println!("  node {} v{} = {}", node, entry.version, entry.value),
                    None => println!("  node {} (absent)", node),
                }
            }
        }
    }

    Ok(())
}
