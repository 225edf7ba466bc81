/// Console command parser and executor
use log::info;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_till1},
    character::complete::{multispace0, space1},
    combinator::{all_consuming, value},
    number::complete::double,
    sequence::delimited,
    IResult,
};
use thiserror::Error;
use wire3d_core::{GeometryError, Mesh, MeshData, ObjectId, Registry, SceneObject, Texture, Vec3};

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("cannot parse command: {0}")]
    Parse(String),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("cannot load texture '{path}': {source}")]
    Texture {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// Primitive meshes the console can create
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Square,
    Cube,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Translate { name: String, delta: Vec3 },
    Scale { name: String, factors: Vec3 },
    /// Angles are typed in degrees
    Rotate { name: String, degrees: Vec3 },
    AddObject { name: String, shape: Shape, size: f64 },
    AddTexture { name: String, path: String },
    Show(String),
    Hide(String),
    Remove(String),
    Select(String),
    List,
    Quit,
}

/// Parse one console line
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    match all_consuming(delimited(multispace0, command, multispace0))(line) {
        Ok((_, command)) => Ok(command),
        Err(e) => Err(CommandError::Parse(format!("{line:?} ({e:?})"))),
    }
}

fn command(input: &str) -> IResult<&str, Command> {
    alt((
        translate, scale, rotate, add_object, add_texture, show, hide, remove, select, list, quit,
    ))(input)
}

fn word(input: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c.is_whitespace())(input)
}

fn vector3(input: &str) -> IResult<&str, Vec3> {
    let (input, x) = double(input)?;
    let (input, _) = space1(input)?;
    let (input, y) = double(input)?;
    let (input, _) = space1(input)?;
    let (input, z) = double(input)?;
    Ok((input, Vec3::new(x, y, z)))
}

/// `<keyword> <name> x y z`
fn named_vector<'a>(keyword: &'static str, input: &'a str) -> IResult<&'a str, (String, Vec3)> {
    let (input, _) = tag(keyword)(input)?;
    let (input, _) = space1(input)?;
    let (input, name) = word(input)?;
    let (input, _) = space1(input)?;
    let (input, v) = vector3(input)?;
    Ok((input, (name.to_string(), v)))
}

/// `<keyword> <name>`
fn named<'a>(keyword: &'static str, input: &'a str) -> IResult<&'a str, String> {
    let (input, _) = tag(keyword)(input)?;
    let (input, _) = space1(input)?;
    let (input, name) = word(input)?;
    Ok((input, name.to_string()))
}

fn translate(input: &str) -> IResult<&str, Command> {
    let (input, (name, delta)) = named_vector("translate", input)?;
    Ok((input, Command::Translate { name, delta }))
}

fn scale(input: &str) -> IResult<&str, Command> {
    let (input, (name, factors)) = named_vector("scale", input)?;
    Ok((input, Command::Scale { name, factors }))
}

fn rotate(input: &str) -> IResult<&str, Command> {
    let (input, (name, degrees)) = named_vector("rotate", input)?;
    Ok((input, Command::Rotate { name, degrees }))
}

fn add_object(input: &str) -> IResult<&str, Command> {
    let (input, name) = named("add-object", input)?;
    let (input, _) = space1(input)?;
    let (input, shape) = alt((
        value(Shape::Square, tag("square")),
        value(Shape::Cube, tag("cube")),
    ))(input)?;
    let (input, _) = space1(input)?;
    let (input, size) = double(input)?;
    Ok((input, Command::AddObject { name, shape, size }))
}

fn add_texture(input: &str) -> IResult<&str, Command> {
    let (input, name) = named("add-texture", input)?;
    let (input, _) = space1(input)?;
    let (input, path) = word(input)?;
    Ok((
        input,
        Command::AddTexture {
            name,
            path: path.to_string(),
        },
    ))
}

fn show(input: &str) -> IResult<&str, Command> {
    let (input, name) = named("show", input)?;
    Ok((input, Command::Show(name)))
}

fn hide(input: &str) -> IResult<&str, Command> {
    let (input, name) = named("hide", input)?;
    Ok((input, Command::Hide(name)))
}

fn remove(input: &str) -> IResult<&str, Command> {
    let (input, name) = named("remove", input)?;
    Ok((input, Command::Remove(name)))
}

fn select(input: &str) -> IResult<&str, Command> {
    let (input, name) = named("select", input)?;
    Ok((input, Command::Select(name)))
}

fn list(input: &str) -> IResult<&str, Command> {
    value(Command::List, tag("list"))(input)
}

fn quit(input: &str) -> IResult<&str, Command> {
    value(Command::Quit, alt((tag("quit"), tag("q"))))(input)
}

/// Apply a command to the scene and describe the result.
///
/// `selected` is the object keyboard rotation applies to. `Quit` is the
/// caller's business and is reported back unchanged.
pub fn execute(
    command: Command,
    registry: &mut Registry,
    selected: &mut Option<ObjectId>,
) -> Result<String, CommandError> {
    let message = match command {
        Command::Translate { name, delta } => {
            registry.get_by_name_mut(&name)?.translate(&delta)?;
            format!("moved {name}")
        }
        Command::Scale { name, factors } => {
            registry.get_by_name_mut(&name)?.scale_by(&factors)?;
            format!("scaled {name}")
        }
        Command::Rotate { name, degrees } => {
            let radians = degrees.map(f64::to_radians);
            registry.get_by_name_mut(&name)?.rotate(&radians)?;
            format!("rotated {name}")
        }
        Command::AddObject { name, shape, size } => {
            if !(size.is_finite() && size > 0.0) {
                return Err(GeometryError::Argument(format!("size must be positive, got {size}")).into());
            }
            let data = match shape {
                Shape::Square => MeshData::square(size),
                Shape::Cube => MeshData::cube(size),
            };
            let id = registry.add(SceneObject::mesh(name.as_str(), Mesh::from_data(&data)?));
            *selected = Some(id);
            format!("added {name} as {id}")
        }
        Command::AddTexture { name, path } => {
            let id = registry.id_of(&name)?;
            registry.mesh(id)?;
            let image = image::open(&path)
                .map_err(|source| CommandError::Texture {
                    path: path.clone(),
                    source,
                })?
                .to_rgba8();
            let (width, height) = image.dimensions();
            let texture = Texture::new(width, height, image.into_raw())?;
            registry.mesh_mut(id)?.add_texture(path.as_str(), texture);
            format!("{name} now has texture {path} ({width}x{height})")
        }
        Command::Show(name) => {
            registry.get_by_name_mut(&name)?.set_visible(true);
            format!("showing {name}")
        }
        Command::Hide(name) => {
            registry.get_by_name_mut(&name)?.set_visible(false);
            format!("hid {name}")
        }
        Command::Remove(name) => {
            let removed = registry.remove_by_name(&name)?;
            if *selected == removed.id() {
                *selected = None;
            }
            format!("removed {name}")
        }
        Command::Select(name) => {
            let id = registry.id_of(&name)?;
            *selected = Some(id);
            format!("selected {name}")
        }
        Command::List => registry
            .iter()
            .map(|object| {
                let id = object.id().map(|id| id.to_string()).unwrap_or_default();
                let hidden = if object.is_visible() { "" } else { ", hidden" };
                format!("{id} {} ({}{hidden})", object.name(), object.kind().name())
            })
            .collect::<Vec<_>>()
            .join("  "),
        Command::Quit => "bye".to_string(),
    };
    info!("console: {message}");
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transform_commands() {
        assert_eq!(
            parse_command("translate square 200 -100 0").unwrap(),
            Command::Translate {
                name: "square".to_string(),
                delta: Vec3::new(200.0, -100.0, 0.0)
            }
        );
        assert_eq!(
            parse_command("  scale cube 2 2.5 1e0 ").unwrap(),
            Command::Scale {
                name: "cube".to_string(),
                factors: Vec3::new(2.0, 2.5, 1.0)
            }
        );
        assert!(matches!(
            parse_command("rotate cube 0 90 0").unwrap(),
            Command::Rotate { .. }
        ));
    }

    #[test]
    fn test_parse_scene_commands() {
        assert_eq!(
            parse_command("add-object box cube 40").unwrap(),
            Command::AddObject {
                name: "box".to_string(),
                shape: Shape::Cube,
                size: 40.0
            }
        );
        assert_eq!(
            parse_command("add-texture box assets/bricks.png").unwrap(),
            Command::AddTexture {
                name: "box".to_string(),
                path: "assets/bricks.png".to_string()
            }
        );
        assert_eq!(parse_command("hide box").unwrap(), Command::Hide("box".to_string()));
        assert_eq!(parse_command("list").unwrap(), Command::List);
        assert_eq!(parse_command("q").unwrap(), Command::Quit);
    }

    #[test]
    fn test_parse_errors() {
        for line in ["", "translate square 1 2", "scale", "add-object x sphere 3", "list extra", "fly away"] {
            assert!(matches!(parse_command(line), Err(CommandError::Parse(_))), "{line}");
        }
    }

    #[test]
    fn test_execute_against_registry() {
        let mut registry = Registry::new();
        let mut selected = None;

        execute(parse_command("add-object sq square 10").unwrap(), &mut registry, &mut selected).unwrap();
        let id = registry.id_of("sq").unwrap();
        assert_eq!(selected, Some(id));

        execute(parse_command("translate sq 1 2 3").unwrap(), &mut registry, &mut selected).unwrap();
        assert_eq!(*registry.get(id).unwrap().origin(), Vec3::new(1.0, 2.0, 3.0));

        execute(parse_command("rotate sq 0 0 180").unwrap(), &mut registry, &mut selected).unwrap();
        assert!((registry.get(id).unwrap().rotation().z - std::f64::consts::PI).abs() < 1e-12);

        execute(parse_command("hide sq").unwrap(), &mut registry, &mut selected).unwrap();
        assert!(!registry.get(id).unwrap().is_visible());

        let listing = execute(Command::List, &mut registry, &mut selected).unwrap();
        assert!(listing.contains("sq (mesh, hidden)"));

        execute(parse_command("remove sq").unwrap(), &mut registry, &mut selected).unwrap();
        assert!(registry.is_empty());
        assert_eq!(selected, None);
    }

    #[test]
    fn test_execute_reports_unknown_objects() {
        let mut registry = Registry::new();
        let mut selected = None;
        let err = execute(parse_command("translate ghost 1 1 1").unwrap(), &mut registry, &mut selected)
            .unwrap_err();
        assert!(matches!(err, CommandError::Geometry(GeometryError::NotFound(_))));

        let err = execute(
            Command::AddObject {
                name: "flat".to_string(),
                shape: Shape::Square,
                size: 0.0,
            },
            &mut registry,
            &mut selected,
        )
        .unwrap_err();
        assert!(matches!(err, CommandError::Geometry(GeometryError::Argument(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_texture_requires_existing_mesh_before_decoding() {
        let mut registry = Registry::new();
        let mut selected = None;
        let err = execute(
            parse_command("add-texture nothing missing.png").unwrap(),
            &mut registry,
            &mut selected,
        )
        .unwrap_err();
        assert!(matches!(err, CommandError::Geometry(GeometryError::NotFound(_))));

        execute(parse_command("add-object sq square 1").unwrap(), &mut registry, &mut selected).unwrap();
        let err = execute(
            parse_command("add-texture sq /nonexistent/missing.png").unwrap(),
            &mut registry,
            &mut selected,
        )
        .unwrap_err();
        assert!(matches!(err, CommandError::Texture { .. }));
    }
}
