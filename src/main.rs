use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use colored::*;
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

use weightrs::bulk_planner::RateAssessment;
use weightrs::config::AppConfig;
use weightrs::evaluation::EvaluationDraft;
use weightrs::export::{export_to_file, DateRange, ExportFormat};
use weightrs::import::ImportManager;
use weightrs::insights::{smart_insights, CutPace, Insight};
use weightrs::logging::init_logging;
use weightrs::macros::MacroTargets;
use weightrs::nutrition_log::{FoodItem, MealType, NutritionGoals, NutritionLogStore};
use weightrs::{
    BiologicalSex, ExperienceLevel, GoalType, NewProfile, ProfileUpdate, WeightEntry, WeightStore,
};

/// weightrs - body-weight and nutrition tracking CLI
///
/// Tracks daily weigh-ins, derives trend statistics and pace insights, and
/// estimates energy needs and macros from a skin-fold evaluation.
#[derive(Parser)]
#[command(name = "weightrs")]
#[command(version)]
#[command(about = "Body-weight and nutrition tracking CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the profile, or update fields of the existing one
    Profile {
        #[arg(long)]
        name: Option<String>,

        /// bulk, cut or maintenance
        #[arg(short, long)]
        goal: Option<GoalType>,

        /// Starting weight in kg (required when creating)
        #[arg(long)]
        start_weight: Option<f64>,

        /// Start date (YYYY-MM-DD, default today)
        #[arg(long)]
        start_date: Option<NaiveDate>,

        /// Target weight in kg
        #[arg(short, long)]
        target: Option<f64>,

        /// Height in cm
        #[arg(long)]
        height: Option<f64>,

        #[arg(long)]
        age: Option<u32>,

        /// male or female
        #[arg(long)]
        gender: Option<BiologicalSex>,

        /// beginner, intermediate or advanced
        #[arg(long)]
        experience: Option<ExperienceLevel>,

        /// Planned bulk length in months
        #[arg(long)]
        bulk_months: Option<u32>,
    },

    /// Record a weigh-in
    Add {
        /// Weight in kg
        weight: f64,

        /// Date (YYYY-MM-DD, default today)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Day after a cheat meal
        #[arg(long)]
        cheat_meal: bool,

        /// Weight inflated by fluid retention
        #[arg(long)]
        retention: bool,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Delete a weigh-in by id
    Delete { id: String },

    /// List recent weigh-ins
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "14")]
        limit: usize,
    },

    /// Show trend statistics
    Stats {
        /// Include the week-by-week breakdown
        #[arg(short, long)]
        weekly: bool,
    },

    /// Show pace and consistency insights
    Insights,

    /// Suggest unflagged cheat-meal and retention days
    Anomalies,

    /// Import weigh-ins (CSV) or a full backup (JSON); replaces existing data
    Import {
        /// Input file path (.csv or .json)
        file: PathBuf,
    },

    /// Export weigh-ins (CSV) or a full backup (JSON)
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Export format (csv, json); defaults to the output extension
        #[arg(short = 'f', long)]
        format: Option<String>,

        /// Date range start (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Date range end (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// Run a nutrition evaluation from a TOML or JSON form file
    Evaluate {
        /// Form file with age, gender, height, weight, skin_folds, ...
        form: PathBuf,

        /// Replace the nutrition goals with the macros for the profile goal
        #[arg(long)]
        apply_goals: bool,
    },

    /// Show the bulk plan for the profile
    Plan,

    /// Log a food to a meal
    Log {
        /// breakfast, lunch, dinner, snacks, pre_workout, post_workout
        #[arg(short, long)]
        meal: MealType,

        /// Food name
        food: String,

        /// Quantity in grams
        grams: Decimal,

        /// kcal per 100 g
        #[arg(long)]
        calories: Decimal,

        /// Protein g per 100 g
        #[arg(long, default_value = "0")]
        protein: Decimal,

        /// Carbs g per 100 g
        #[arg(long, default_value = "0")]
        carbs: Decimal,

        /// Fat g per 100 g
        #[arg(long, default_value = "0")]
        fat: Decimal,

        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Show a day's food log
    Day {
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Add (or remove) a glass of water
    Water {
        #[arg(short, long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        remove: bool,
    },

    /// Show or initialise the configuration
    Config {
        /// Write the default configuration file
        #[arg(long)]
        init: bool,
    },
}

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Weight (kg)")]
    weight: String,
    #[tabled(rename = "Flags")]
    flags: String,
    #[tabled(rename = "Notes")]
    notes: String,
    #[tabled(rename = "Id")]
    id: String,
}

impl From<&WeightEntry> for EntryRow {
    fn from(entry: &WeightEntry) -> Self {
        let mut flags = Vec::new();
        if entry.is_cheat_meal {
            flags.push("cheat meal");
        }
        if entry.is_retention {
            flags.push("retention");
        }
        EntryRow {
            date: entry.date.to_string(),
            weight: format!("{:.1}", entry.weight),
            flags: flags.join(", "),
            notes: entry.notes.clone().unwrap_or_default(),
            id: entry.id.chars().take(8).collect(),
        }
    }
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn metric(metric: &str, value: impl ToString) -> MetricRow {
    MetricRow {
        metric: metric.to_string(),
        value: value.to_string(),
    }
}

#[derive(Tabled)]
struct MacroRow {
    #[tabled(rename = "Goal")]
    goal: String,
    #[tabled(rename = "kcal")]
    calories: String,
    #[tabled(rename = "Protein (g)")]
    protein: String,
    #[tabled(rename = "Carbs (g)")]
    carbs: String,
    #[tabled(rename = "Fat (g)")]
    fat: String,
}

fn macro_row(goal: GoalType, targets: &MacroTargets) -> MacroRow {
    MacroRow {
        goal: goal.to_string(),
        calories: format!("{:.0}", targets.calories),
        protein: format!("{:.0}", targets.protein),
        carbs: format!("{:.0}", targets.carbs),
        fat: format!("{:.0}", targets.fat),
    }
}

fn print_table<T: Tabled>(rows: impl IntoIterator<Item = T>) {
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

struct App {
    config: AppConfig,
    config_path: PathBuf,
    weight_path: PathBuf,
}

impl App {
    fn load_store(&self) -> Result<WeightStore> {
        WeightStore::load(&self.weight_path)
            .with_context(|| format!("Failed to load {}", self.weight_path.display()))
    }

    fn save_store(&self, store: &mut WeightStore) -> Result<()> {
        store
            .save(&self.weight_path)
            .with_context(|| format!("Failed to save {}", self.weight_path.display()))?;
        Ok(())
    }

    fn load_log(&self) -> Result<(NutritionLogStore, PathBuf)> {
        let path = self.config.settings.nutrition_path();
        let log = NutritionLogStore::load(&path, self.config.nutrition.clone())
            .with_context(|| format!("Failed to load {}", path.display()))?;
        Ok((log, path))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(cli.config.as_deref())?;
    let mut log_config = config.logging.clone();
    log_config.level = log_config.level.raised_by(cli.verbose);
    init_logging(&log_config)?;

    let app = App {
        config_path: cli
            .config
            .clone()
            .unwrap_or_else(AppConfig::default_config_path),
        weight_path: config.settings.weight_path(),
        config,
    };

    match cli.command {
        Commands::Profile {
            name,
            goal,
            start_weight,
            start_date,
            target,
            height,
            age,
            gender,
            experience,
            bulk_months,
        } => {
            let mut store = app.load_store()?;
            let profile = if store.profile().is_some() {
                store.update_profile(ProfileUpdate {
                    name,
                    goal_type: goal,
                    target_weight: target.map(Some),
                    height,
                    age,
                    gender,
                    bulk_duration_months: bulk_months,
                    experience_level: experience,
                })?
            } else {
                let start_weight = match start_weight {
                    Some(w) => w,
                    None => bail!("--start-weight is required to create a profile"),
                };
                store.create_profile(NewProfile {
                    name: name.unwrap_or_else(|| "Me".to_string()),
                    goal_type: goal.unwrap_or(GoalType::Maintenance),
                    target_weight: target,
                    start_weight,
                    start_date: start_date.unwrap_or_else(today),
                    height,
                    age,
                    gender,
                    bulk_duration_months: bulk_months,
                    experience_level: experience,
                })?
            };
            println!(
                "{} {} ({}, current {:.1} kg)",
                "✓ Profile saved:".green().bold(),
                profile.name,
                profile.goal_type,
                profile.current_weight
            );
            app.save_store(&mut store)?;
        }

        Commands::Add {
            weight,
            date,
            cheat_meal,
            retention,
            notes,
        } => {
            let mut store = app.load_store()?;
            let mut entry = WeightEntry::new(date.unwrap_or_else(today), weight);
            entry.is_cheat_meal = cheat_meal;
            entry.is_retention = retention;
            entry.notes = notes;
            let date = entry.date;
            store.add_entry(entry)?;
            app.save_store(&mut store)?;
            println!("{} {:.1} kg on {}", "✓ Recorded".green().bold(), weight, date);
        }

        Commands::Delete { id } => {
            let mut store = app.load_store()?;
            let full_id = store
                .entries()
                .iter()
                .find(|e| e.id == id || e.id.starts_with(&id))
                .map(|e| e.id.clone())
                .unwrap_or(id);
            let removed = store.delete_entry(&full_id)?;
            app.save_store(&mut store)?;
            println!(
                "{} {:.1} kg on {}",
                "✓ Deleted".green().bold(),
                removed.weight,
                removed.date
            );
        }

        Commands::List { limit } => {
            let store = app.load_store()?;
            if store.entries().is_empty() {
                println!("{}", "No weigh-ins recorded yet".yellow());
            } else {
                print_table(store.entries().iter().take(limit).map(EntryRow::from));
            }
        }

        Commands::Stats { weekly } => {
            let store = app.load_store()?;
            let stats = store.statistics();
            if stats.total_entries == 0 {
                println!("{}", "No weigh-ins recorded yet".yellow());
                return Ok(());
            }

            println!("{}", "Weight statistics".blue().bold());
            let mut rows = vec![
                metric("Entries", stats.total_entries),
                metric("Days tracked", stats.days_tracked),
                metric("Consistency", format!("{:.0}%", stats.consistency_score)),
                metric("Average weight", format!("{:.2} kg", stats.average_weight)),
                metric("Total change", format!("{:+.2} kg", stats.weight_change)),
                metric("Weekly rate", format!("{:+.3} kg/week", stats.weekly_average_change)),
                metric("Monthly rate", format!("{:+.2} kg/month", stats.monthly_average_change)),
                metric("7-day average", format!("{:.2} kg", stats.moving_average_7)),
                metric("14-day average", format!("{:.2} kg", stats.moving_average_14)),
                metric("30-day average", format!("{:.2} kg", stats.moving_average_30)),
                metric("Cheat meals", stats.cheat_meal_count),
                metric("Retention days", stats.retention_count),
            ];
            if let Some(projected) = stats.projected_weight_30_days {
                rows.push(metric("In 30 days", format!("{:.1} kg", projected)));
            }
            if let Some(days) = stats.estimated_days_to_goal {
                rows.push(metric("Days to goal", format!("{:.0}", days)));
            }
            print_table(rows);

            if weekly {
                println!("{}", "Weekly breakdown".blue().bold());
                let rows = store.weekly_analysis().into_iter().map(|w| {
                    vec![
                        format!("{} - {}", w.week_start, w.week_end),
                        format!("{:.2}", w.average_weight),
                        format!("{:+.2}", w.weight_change),
                        w.entries.to_string(),
                        w.cheat_meals.to_string(),
                        w.retentions.to_string(),
                    ]
                });
                let mut builder = tabled::builder::Builder::default();
                builder.push_record(["Week", "Avg (kg)", "Change", "Entries", "Cheat", "Retention"].map(String::from));
                for row in rows {
                    builder.push_record(row);
                }
                let mut table = builder.build();
                table.with(Style::rounded());
                println!("{}", table);
            }
        }

        Commands::Insights => {
            let store = app.load_store()?;
            let goal = store
                .profile()
                .map(|p| p.goal_type)
                .unwrap_or(GoalType::Maintenance);
            let insights = smart_insights(&store.statistics(), goal);
            if insights.is_empty() {
                println!("{}", "Not enough data for insights yet".yellow());
            }
            for insight in insights {
                let line = insight.to_string();
                let styled = match insight {
                    Insight::LowConsistency
                    | Insight::FrequentCheatMeals
                    | Insight::FrequentRetention => line.yellow(),
                    Insight::BulkPace { pace, .. } if pace.muscle_percentage() < 60 => {
                        line.yellow()
                    }
                    Insight::CutPace {
                        pace: CutPace::TooFast | CutPace::NotLosing,
                        ..
                    } => line.red(),
                    Insight::ExcellentConsistency | Insight::NearGoal { .. } => line.green(),
                    _ => line.normal(),
                };
                println!("• {}", styled);
            }
        }

        Commands::Anomalies => {
            let store = app.load_store()?;
            let report = store.anomalies();
            if report.is_empty() {
                println!("{}", "✓ No unflagged spikes found".green());
                return Ok(());
            }
            let describe = |ids: &[String], label: &str| {
                for id in ids {
                    if let Some(entry) = store.entry(id) {
                        println!("  {} {} {:.1} kg", label, entry.date, entry.weight);
                    }
                }
            };
            println!("{}", "Possible unflagged days".yellow().bold());
            describe(&report.possible_cheat_meals, "cheat meal:");
            describe(&report.possible_retentions, "retention: ");
        }

        Commands::Import { file } => {
            println!("{}", "Importing weight data...".green().bold());
            let report = ImportManager::new().import_file(&file)?;
            for warning in &report.warnings {
                println!("  {} {}", "skipped".yellow(), warning);
            }
            let imported = report.entry_count();
            let mut store = app.load_store()?;
            report.apply_to(&mut store);
            app.save_store(&mut store)?;
            println!("{} {} entries", "✓ Imported".green(), imported);
        }

        Commands::Export {
            output,
            format,
            from,
            to,
        } => {
            let format = match format {
                Some(f) => ExportFormat::from_str(&f)?,
                None => ExportFormat::from_path(&output)?,
            };
            let store = app.load_store()?;
            let count = export_to_file(
                &store.to_backup(),
                format,
                DateRange::new(from, to),
                &output,
            )?;
            println!(
                "{} {} entries to {}",
                "✓ Exported".green(),
                count,
                output.display()
            );
        }

        Commands::Evaluate { form, apply_goals } => {
            let draft = read_draft(&form)?;
            let evaluation = draft.commit()?;
            let data = &evaluation.calculated;

            println!("{}", "Nutrition evaluation".blue().bold());
            print_table(vec![
                metric("Body fat", format!("{:.1}%", data.body_fat_percentage)),
                metric("Lean mass", format!("{:.1} kg", data.lean_mass)),
                metric("Fat mass", format!("{:.1} kg", data.fat_mass)),
                metric("BMR", format!("{:.0} kcal", data.bmr)),
                metric("TDEE", format!("{:.0} kcal", data.tdee)),
                metric("  NEAT", format!("{:.0} kcal", data.tdee_breakdown.neat)),
                metric("  Weights", format!("{:.0} kcal", data.tdee_breakdown.weights)),
                metric("  Cardio", format!("{:.0} kcal", data.tdee_breakdown.cardio)),
                metric(
                    "Real TDEE",
                    data.real_tdee
                        .map(|t| format!("{:.0} kcal", t))
                        .unwrap_or_else(|| "-".to_string()),
                ),
            ]);
            print_table(
                GoalType::ALL
                    .iter()
                    .map(|goal| macro_row(*goal, data.macros.for_goal(*goal))),
            );

            if let Some(status) = evaluation.reverse_diet.weeks_remaining() {
                println!("Reverse diet: {:.0} weeks remaining", status);
            }
            let training = evaluation.training_profile(today());
            println!(
                "Training: {:.1} years ({}), expected lean gain {:.2} kg/year",
                training.years, training.level, training.potential.yearly_gain
            );

            let mut store = app.load_store()?;
            let goal = store
                .profile()
                .map(|p| p.goal_type)
                .unwrap_or(GoalType::Maintenance);
            if apply_goals {
                let (log, path) = app.load_log()?;
                let water = log.goals().water;
                log.set_goals(NutritionGoals::from_macros(data.macros.for_goal(goal), water));
                log.save(&path)?;
                println!("{} {} goals applied", "✓".green(), goal);
            }
            store.set_evaluation(evaluation);
            app.save_store(&mut store)?;
        }

        Commands::Plan => {
            let store = app.load_store()?;
            let plan = store.bulk_plan()?;
            println!(
                "{} {} lifter, {} months, {:.2}-{:.2} kg/week",
                "Bulk plan:".blue().bold(),
                plan.experience_level,
                plan.duration_months,
                plan.range.min,
                plan.range.max
            );
            let p = &plan.projections;
            let mut builder = tabled::builder::Builder::default();
            builder.push_record(["Scenario", "kg/week", "kg/month", "Total", "Final weight"].map(String::from));
            for (name, projection) in [
                ("conservative", p.conservative),
                ("optimal", p.optimal),
                ("aggressive", p.aggressive),
            ] {
                builder.push_record([
                    name.to_string(),
                    format!("{:.2}", projection.weekly_gain),
                    format!("{:.2}", projection.monthly_gain),
                    format!("{:+.1}", projection.total_gain),
                    format!("{:.1}", projection.final_weight),
                ]);
            }
            let mut table = builder.build();
            table.with(Style::rounded());
            println!("{}", table);

            if let (Some(progress), Some(assessment)) = (plan.progress, plan.assessment) {
                let verdict = match assessment {
                    RateAssessment::BelowRange => "below the recommended range".yellow(),
                    RateAssessment::WithinRange => "within the recommended range".green(),
                    RateAssessment::AboveRange => "above the recommended range".red(),
                };
                println!(
                    "Progress: {:+.1} kg over {} days ({:+.2} kg/week), {}",
                    progress.weight_gained, progress.days_elapsed, progress.weekly_rate, verdict
                );
            }
        }

        Commands::Log {
            meal,
            food,
            grams,
            calories,
            protein,
            carbs,
            fat,
            date,
        } => {
            let (log, path) = app.load_log()?;
            let item = FoodItem::new(food, calories, protein, carbs, fat);
            let date = date.unwrap_or_else(today);
            let entry = log.add_food_to_meal(date, meal, &item, grams)?;
            log.save(&path)?;
            println!(
                "{} {} g {} to {} ({} kcal)",
                "✓ Logged".green().bold(),
                entry.grams,
                item.name,
                log.meal_name(meal),
                entry.nutrients.calories
            );
        }

        Commands::Day { date } => {
            let (log, _) = app.load_log()?;
            let date = date.unwrap_or_else(today);
            let Some(day) = log.log_for(date) else {
                println!("{}", format!("Nothing logged on {}", date).yellow());
                return Ok(());
            };

            println!("{}", format!("Food log for {}", date).blue().bold());
            let mut builder = tabled::builder::Builder::default();
            builder.push_record(["Meal", "Food", "Grams", "kcal", "P", "C", "F"].map(String::from));
            for meal in day.meals.iter().filter(|m| !m.foods.is_empty()) {
                let name = log.meal_name(meal.meal_type);
                for entry in &meal.foods {
                    builder.push_record([
                        name.clone(),
                        entry.food_item.name.clone(),
                        entry.grams.to_string(),
                        entry.nutrients.calories.to_string(),
                        entry.nutrients.protein.to_string(),
                        entry.nutrients.carbs.to_string(),
                        entry.nutrients.fat.to_string(),
                    ]);
                }
            }
            builder.push_record([
                "Total".to_string(),
                String::new(),
                String::new(),
                format!("{} / {}", day.totals.calories, day.targets.calories),
                format!("{} / {}", day.totals.protein, day.targets.protein),
                format!("{} / {}", day.totals.carbs, day.targets.carbs),
                format!("{} / {}", day.totals.fat, day.targets.fat),
            ]);
            let mut table = builder.build();
            table.with(Style::rounded());
            println!("{}", table);
            println!("Water: {}/{} glasses", day.water_glasses, day.water_target);
            if let Some(notes) = &day.notes {
                println!("Notes: {}", notes);
            }
        }

        Commands::Water { date, remove } => {
            let (log, path) = app.load_log()?;
            let date = date.unwrap_or_else(today);
            let glasses = if remove {
                log.remove_water(date)
            } else {
                Some(log.add_water(date))
            };
            match glasses {
                Some(glasses) => {
                    log.save(&path)?;
                    println!("{} {} glasses on {}", "✓ Water:".green(), glasses, date);
                }
                None => println!("{}", format!("Nothing logged on {}", date).yellow()),
            }
        }

        Commands::Config { init } => {
            let mut config = app.config.clone();
            if init {
                if app.config_path.exists() {
                    bail!("Config already exists: {}", app.config_path.display());
                }
                config.save_to_file(&app.config_path)?;
                println!(
                    "{} {}",
                    "✓ Wrote".green(),
                    app.config_path.display()
                );
            }
            println!("{}", format!("# {}", app.config_path.display()).dimmed());
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

/// Evaluation forms are TOML unless the extension says JSON
fn read_draft(path: &Path) -> Result<EvaluationDraft> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read form file: {}", path.display()))?;
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let draft = if is_json {
        serde_json::from_str(&content).context("Failed to parse JSON evaluation form")?
    } else {
        toml::from_str(&content).context("Failed to parse TOML evaluation form")?
    };
    Ok(draft)
}

