//! Interactive command-line career day.
//!
//! ```text
//! NVIDIA_API_KEY=nvapi-... careerday
//! ```

use async_trait::async_trait;
use careerday::clients::nvidia::{default_model, NvidiaClient};
use careerday::event::{EventHandler, SimulationEvent};
use careerday::{AgentRole, Simulation};
use std::error::Error;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

const RULE: &str = "======================================================================";
const THIN_RULE: &str = "----------------------------------------------------------------------";

/// Prints agent progress the way a live demo shows it.
struct ConsoleEventHandler;

#[async_trait]
impl EventHandler for ConsoleEventHandler {
    async fn on_simulation_event(&self, event: &SimulationEvent) {
        match event {
            SimulationEvent::TurnStarted { role, .. } => match role {
                AgentRole::Research => println!("\n🤖 [Research Agent] Analyzing career..."),
                AgentRole::ScenarioDesigner => {
                    println!("\n🎨 [Scenario Designer] Creating scenario...")
                }
                AgentRole::Evaluator => println!("\n⚖️ [Evaluator] Analyzing decision..."),
                AgentRole::Narrator => println!("\n📖 [Narrator] Crafting narrative..."),
            },
            SimulationEvent::TurnCompleted {
                role,
                reasoning_preview,
                ..
            } if matches!(role, AgentRole::Research | AgentRole::Evaluator) => {
                println!("   Reasoning: {}...", reasoning_preview)
            }
            SimulationEvent::TurnFailed { role, error } => {
                eprintln!("   [{}] failed: {}", role, error)
            }
            _ => {}
        }
    }
}

fn banner(title: &str) {
    println!("\n{}", RULE);
    println!("{}", title);
    println!("{}", RULE);
}

/// Print `prompt` and read one line. `None` on end of input.
async fn prompt_line(
    lines: &mut Lines<BufReader<Stdin>>,
    prompt: &str,
) -> Result<Option<String>, Box<dyn Error + Send + Sync>> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    Ok(lines.next_line().await?.map(|line| line.trim().to_string()))
}

fn is_quit(input: &str) -> bool {
    matches!(input.to_lowercase().as_str(), "quit" | "exit" | "end")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    careerday::init_logger();

    let api_key = std::env::var("NVIDIA_API_KEY")
        .map_err(|_| "NVIDIA_API_KEY must be set to an NVIDIA API key")?;
    let client = Arc::new(NvidiaClient::new_with_model_str(&api_key, &default_model())?);
    let mut sim = Simulation::new(client).with_event_handler(Arc::new(ConsoleEventHandler));

    println!("{}", RULE);
    println!("🎯 MULTI-AGENT CAREER SIMULATION SYSTEM");
    println!("   Powered by: Research → Design → Evaluate → Narrate Agents");
    println!("{}", RULE);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let career = loop {
        match prompt_line(&mut lines, "\n🎬 What career would you like to experience? ").await? {
            Some(career) if !career.is_empty() => break career,
            Some(_) => continue,
            None => return Ok(()),
        }
    };

    banner("🚀 AGENT COLLABORATION IN PROGRESS...");
    let opening = sim.start_simulation(&career).await?;

    banner("📱 YOUR CAREER DAY BEGINS:");
    println!("{}", opening);

    while !sim.is_complete() {
        println!("\n{}", THIN_RULE);
        let input = match prompt_line(&mut lines, "\n💬 What do you do? (or 'quit' to end): ").await? {
            Some(input) => input,
            None => break,
        };
        if is_quit(&input) {
            break;
        }
        if input.is_empty() {
            continue;
        }

        banner("🤖 AGENTS PROCESSING YOUR DECISION...");
        let response = sim.process_user_decision(&input).await?;

        banner("📱 WHAT HAPPENS NEXT:");
        println!("{}", response);
    }

    banner("🏆 CAREER DAY COMPLETE - GENERATING INSIGHTS...");
    let summary = sim.generate_summary().await?;

    println!("\n📊 SUMMARY:");
    println!("   Career: {}", summary.career);
    println!("   Scenarios Completed: {}", summary.scenarios_completed);
    println!(
        "   Skills Demonstrated: {}",
        summary
            .skills
            .iter()
            .take(5)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("   Agent Interactions: {}", summary.agent_interactions);
    println!("\n{}", summary.summary);
    println!(
        "\n📋 Agent log: {} turns recorded",
        sim.get_agent_log().len()
    );

    Ok(())
}
