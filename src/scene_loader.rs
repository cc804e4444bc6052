use crate::camera::Camera;
use crate::geometry::Mesh;
use crate::scene::*;
use cgmath::*;
use std::collections::HashMap;
use std::error::Error;
use std::rc::Rc;

pub trait SceneLoader {
    fn load(&self, filename: &str) -> Result<Scene, Box<dyn Error>>;
}
pub struct SceneLoaderManager {
    loader: HashMap<String, Rc<dyn SceneLoader>>,
}
impl SceneLoaderManager {
    pub fn register(&mut self, name: &str, loader: Rc<dyn SceneLoader>) {
        self.loader.insert(name.to_string(), loader);
    }
    pub fn load(&self, filename: &str) -> Result<Scene, Box<dyn Error>> {
        let filename_ext = std::path::Path::new(filename)
            .extension()
            .and_then(std::ffi::OsStr::to_str)
            .ok_or_else(|| format!("No file extension provided: {}", filename))?;
        match self.loader.get(filename_ext) {
            Some(loader) => loader.load(filename),
            None => Err(format!(
                "Impossible to found scene loader for {} extension",
                filename_ext
            )
            .into()),
        }
    }
}
impl Default for SceneLoaderManager {
    fn default() -> Self {
        let mut loaders = SceneLoaderManager {
            loader: HashMap::default(),
        };
        loaders.register("obj", Rc::new(OBJSceneLoader::default()));
        loaders
    }
}

/// Load an OBJ file with `tobj`.
/// The camera and the light are placed from the scene bounding box.
pub struct OBJSceneLoader {
    pub img_size: Vector2<u32>,
}
impl Default for OBJSceneLoader {
    fn default() -> Self {
        OBJSceneLoader {
            img_size: Vector2::new(640, 480),
        }
    }
}

impl OBJSceneLoader {
    /// Merge all the models inside a single indexed mesh.
    /// The position indices are kept as they are (no re-indexing),
    /// so the triangles sharing a vertex can be connected.
    pub fn load_mesh(filename: &str) -> Result<Mesh, Box<dyn Error>> {
        let (models, _materials) = tobj::load_obj(
            filename,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: false,
                ..Default::default()
            },
        )?;
        info!("Number of models: {}", models.len());

        let mut positions = vec![];
        let mut normals = vec![];
        let mut indices = vec![];
        let mut have_normals = true;
        for m in &models {
            let mesh = &m.mesh;
            let base = positions.len() as u32;
            let nb_vertices = mesh.positions.len() / 3;
            positions.extend(
                mesh.positions
                    .chunks_exact(3)
                    .map(|p| Point3::new(p[0], p[1], p[2])),
            );

            // Per position normals (only when each position
            // always reference the same normal)
            let mut model_normals = vec![None; nb_vertices];
            if mesh.normal_indices.len() == mesh.indices.len() && !mesh.normals.is_empty() {
                for (i, n) in mesh.indices.iter().zip(mesh.normal_indices.iter()) {
                    let n = *n as usize;
                    let n = Vector3::new(
                        mesh.normals[3 * n],
                        mesh.normals[3 * n + 1],
                        mesh.normals[3 * n + 2],
                    );
                    match model_normals[*i as usize] {
                        None => model_normals[*i as usize] = Some(n),
                        Some(prev) if prev != n => have_normals = false,
                        _ => {}
                    }
                }
            }
            if model_normals.iter().any(|n| n.is_none()) {
                have_normals = false;
            }
            normals.extend(model_normals.into_iter().map(|n| n.unwrap_or_else(Vector3::zero)));

            indices.extend(
                mesh.indices
                    .chunks_exact(3)
                    .map(|i| [base + i[0], base + i[1], base + i[2]]),
            );
            info!(
                " - {}: {} vertices, {} triangles",
                m.name,
                nb_vertices,
                mesh.indices.len() / 3
            );
        }

        if !have_normals {
            info!("Normals are missing or split, use smooth normals");
            normals.clear();
        }
        Ok(Mesh::new(positions, normals, indices))
    }
}

impl SceneLoader for OBJSceneLoader {
    fn load(&self, filename: &str) -> Result<Scene, Box<dyn Error>> {
        let mesh = OBJSceneLoader::load_mesh(filename)?;
        if mesh.is_empty() {
            return Err(format!("No triangle inside {}", filename).into());
        }
        info!("Number of triangles: {}", mesh.triangles.len());
        info!("Bounding box: {:?}", mesh.aabb);
        let nb_boundary = mesh.nb_boundary_edges();
        if nb_boundary != 0 {
            warn!(
                "{} boundary (or non-manifold) edges, mesh walks will stop on them",
                nb_boundary
            );
        }

        let camera = Camera::framing(&mesh.aabb, self.img_size);
        camera.print_info();
        let light_pos = Scene::default_light(&mesh.aabb);
        info!("Light position: {:?}", light_pos);
        Ok(Scene::new(mesh, camera, light_pos))
    }
}
