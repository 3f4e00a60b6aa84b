use crate::areas::repository::Repository;
use crate::artifacts::objects::object_type::ObjectType;

impl Repository {
    /// Print the raw payload of `name`, dereferenced to `object_type`
    pub fn cat_file(&self, object_type: ObjectType, name: &str) -> anyhow::Result<()> {
        let oid = self
            .refs()
            .find(self.database(), name, Some(object_type))?;
        let (_, payload) = self.database().read_raw(&oid)?;

        self.writer().write_all(&payload)?;

        Ok(())
    }
}
